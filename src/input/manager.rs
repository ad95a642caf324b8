// Input manager - Event pump wiring device changes into actions

use super::action::{Action, ActionId};
use super::action_set::ActionSet;
use super::config::InputSettings;
use super::control::{DeviceState, InputSource};
use super::engine::Backend;
use super::modifier::ModifierRegistry;
use super::monitor::MonitorRegistry;
use super::timeout::{Timeout, TimeoutQueue};
use super::{InputError, Result};
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::PhysicalKey;

/// Device state plus the collaborators every engine call borrows
#[derive(Debug)]
struct Services {
    devices: DeviceState,
    modifiers: ModifierRegistry,
    monitors: MonitorRegistry,
    timeouts: TimeoutQueue,
}

impl Services {
    fn backend(&mut self) -> Backend<'_> {
        Backend {
            controls: &self.devices,
            modifiers: &self.modifiers,
            monitors: &mut self.monitors,
            timeouts: &mut self.timeouts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Standalone(usize),
    Member { set: usize, index: usize },
}

/// Owns the device state, monitors and timeouts, and routes events to actions
#[derive(Debug)]
pub struct InputManager {
    services: Services,

    /// Action sets, addressed by the index `add_set` returned
    sets: Vec<ActionSet>,

    /// Standalone actions
    actions: Vec<Action>,

    settings: InputSettings,
}

impl InputManager {
    /// Create a new input manager
    pub fn new(settings: InputSettings) -> Self {
        Self {
            services: Services {
                devices: DeviceState::with_press_threshold(settings.press_threshold),
                modifiers: ModifierRegistry::new(settings),
                monitors: MonitorRegistry::new(),
                timeouts: TimeoutQueue::new(),
            },
            sets: Vec::new(),
            actions: Vec::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Register custom modifiers here before enabling actions that use them
    pub fn modifiers_mut(&mut self) -> &mut ModifierRegistry {
        &mut self.services.modifiers
    }

    /// Latest known device values
    pub fn devices(&self) -> &DeviceState {
        &self.services.devices
    }

    pub fn monitors(&self) -> &MonitorRegistry {
        &self.services.monitors
    }

    /// Take ownership of a standalone action
    pub fn add_action(&mut self, action: Action) -> ActionId {
        let id = action.id();
        self.actions.push(action);
        id
    }

    /// Take ownership of a set; returns its index
    pub fn add_set(&mut self, set: ActionSet) -> usize {
        self.sets.push(set);
        self.sets.len() - 1
    }

    pub fn set(&self, index: usize) -> Option<&ActionSet> {
        self.sets.get(index)
    }

    pub fn set_mut(&mut self, index: usize) -> Option<&mut ActionSet> {
        self.sets.get_mut(index)
    }

    pub fn sets(&self) -> &[ActionSet] {
        &self.sets
    }

    /// Look up any owned action, standalone or set member
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        match self.locate(id)? {
            Location::Standalone(i) => self.actions.get(i),
            Location::Member { set, index } => self.sets[set].action(index),
        }
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        match self.locate(id)? {
            Location::Standalone(i) => self.actions.get_mut(i),
            Location::Member { set, index } => self.sets[set].action_mut(index),
        }
    }

    /// Find an action by name, searching standalone actions first
    pub fn find_action(&self, name: &str) -> Option<ActionId> {
        self.actions
            .iter()
            .chain(self.sets.iter().flat_map(|set| set.actions().iter()))
            .find(|action| action.name() == Some(name))
            .map(Action::id)
    }

    pub fn enable(&mut self, id: ActionId) -> Result<()> {
        let mut backend = self.services.backend();
        match locate_in(&self.actions, &self.sets, id) {
            Some(Location::Standalone(i)) => self.actions[i].enable(&mut backend),
            Some(Location::Member { set, index }) => {
                self.sets[set].enable_action(index, &mut backend)
            }
            None => Err(not_found(id)),
        }
    }

    pub fn disable(&mut self, id: ActionId) -> Result<()> {
        let mut backend = self.services.backend();
        match locate_in(&self.actions, &self.sets, id) {
            Some(Location::Standalone(i)) => self.actions[i].disable(&mut backend),
            Some(Location::Member { set, index }) => {
                self.sets[set].disable_action(index, &mut backend)
            }
            None => Err(not_found(id)),
        }
    }

    /// Enable every set and standalone action
    pub fn enable_all(&mut self) -> Result<()> {
        let mut backend = self.services.backend();
        for set in &mut self.sets {
            set.enable(&mut backend)?;
        }
        for action in &mut self.actions {
            action.enable(&mut backend)?;
        }
        Ok(())
    }

    /// Disable everything; no monitors or timeouts remain afterwards
    pub fn disable_all(&mut self) -> Result<()> {
        let mut backend = self.services.backend();
        for set in &mut self.sets {
            set.disable(&mut backend)?;
        }
        for action in &mut self.actions {
            action.disable(&mut backend)?;
        }
        Ok(())
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent, time: f64) -> Result<()> {
        // Key repeats are not state changes
        if event.repeat {
            return Ok(());
        }
        match event.physical_key {
            PhysicalKey::Code(key_code) => {
                self.set_value(InputSource::key(key_code), pressed_value(event.state), time)
            }
            PhysicalKey::Unidentified(_) => Ok(()),
        }
    }

    /// Process a mouse button event from winit
    pub fn process_mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
        time: f64,
    ) -> Result<()> {
        self.set_value(InputSource::mouse(button), pressed_value(state), time)
    }

    /// Record a new value and notify every monitoring (action, binding)
    ///
    /// Every subscriber sees the change even if an earlier one fails; the
    /// first error is returned once delivery is complete.
    pub fn set_value(&mut self, source: InputSource, value: f32, time: f64) -> Result<()> {
        if !self.services.devices.set_value(source, value) {
            return Ok(());
        }
        log::trace!("{} = {} at {:.3}s", source, value, time);

        let mut first_error = None;
        for (id, binding_index) in self.services.monitors.monitors_for(source) {
            if let Err(err) = self.deliver_value_change(id, source, binding_index, time) {
                log::warn!("Action {:?} failed on {}: {}", id, source, err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Fire every timeout due at `now`
    /// Call this once per frame after processing all events
    ///
    /// A failing timeout does not stop the rest of the batch.
    pub fn update(&mut self, now: f64) -> Result<()> {
        let mut first_error = None;
        for timeout in self.services.timeouts.drain_expired(now) {
            if let Err(err) = self.fire_timeout(timeout) {
                log::warn!("Timeout for action {:?} failed: {}", timeout.action, err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// When the next timeout is due, for event loops that sleep
    pub fn next_wake_time(&self) -> Option<f64> {
        self.services.timeouts.next_wake_time()
    }

    pub fn pending_timeouts(&self) -> usize {
        self.services.timeouts.len()
    }

    fn deliver_value_change(
        &mut self,
        id: ActionId,
        source: InputSource,
        binding_index: usize,
        time: f64,
    ) -> Result<()> {
        let mut backend = self.services.backend();
        match locate_in(&self.actions, &self.sets, id) {
            Some(Location::Standalone(i)) => {
                self.actions[i].notify_value_changed(source, binding_index, time, &mut backend)
            }
            Some(Location::Member { set, index }) => self.sets[set].notify_value_changed(
                index,
                source,
                binding_index,
                time,
                &mut backend,
            ),
            None => {
                log::warn!("Value change of {} for unknown action {:?}", source, id);
                Ok(())
            }
        }
    }

    fn fire_timeout(&mut self, timeout: Timeout) -> Result<()> {
        let Timeout {
            action: id,
            binding_index,
            modifier_index,
            time,
        } = timeout;
        let mut backend = self.services.backend();
        match locate_in(&self.actions, &self.sets, id) {
            Some(Location::Standalone(i)) => self.actions[i].notify_timer_expired(
                binding_index,
                modifier_index,
                time,
                &mut backend,
            ),
            Some(Location::Member { set, index }) => self.sets[set].notify_timer_expired(
                index,
                binding_index,
                modifier_index,
                time,
                &mut backend,
            ),
            None => {
                log::warn!("Timeout for unknown action {:?}", id);
                Ok(())
            }
        }
    }

    fn locate(&self, id: ActionId) -> Option<Location> {
        locate_in(&self.actions, &self.sets, id)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(InputSettings::default())
    }
}

fn locate_in(actions: &[Action], sets: &[ActionSet], id: ActionId) -> Option<Location> {
    if let Some(i) = actions.iter().position(|a| a.id() == id) {
        return Some(Location::Standalone(i));
    }
    sets.iter().enumerate().find_map(|(set, s)| {
        s.index_of(id)
            .map(|index| Location::Member { set, index })
    })
}

fn not_found(id: ActionId) -> InputError {
    InputError::ActionNotFound(format!("no action with id {}", id.as_u64()))
}

fn pressed_value(state: ElementState) -> f32 {
    match state {
        ElementState::Pressed => 1.0,
        ElementState::Released => 0.0,
    }
}
