// Trigger/phase engine
//
// Runs the per-action state machine: default (modifier-less) logic, modifier
// arbitration, timeouts, and listener dispatch. All entry points take the
// action's slice of resolved bindings explicitly so the same engine drives
// both standalone actions and actions inside a set.

use super::action::ActionId;
use super::control::{ControlNamespace, InputSource};
use super::modifier::{ModifierContext, ModifierRegistry, ModifierRequest};
use super::monitor::ControlMonitor;
use super::phase::Phase;
use super::resolver::{ModifierState, ResolvedBinding};
use super::timeout::TimeoutScheduler;
use super::trigger::{ActionListeners, CallbackContext, TriggerState};
use super::{InputError, Result};

/// Borrowed collaborators for one engine call
pub struct Backend<'a> {
    pub controls: &'a dyn ControlNamespace,
    pub modifiers: &'a ModifierRegistry,
    pub monitors: &'a mut dyn ControlMonitor,
    pub timeouts: &'a mut dyn TimeoutScheduler,
}

/// Phase-related state of a single action
#[derive(Debug)]
pub(crate) struct ActionState {
    pub(crate) id: ActionId,
    pub(crate) name: Option<String>,
    pub(crate) phase: Phase,
    pub(crate) last_trigger: TriggerState,
    pub(crate) listeners: ActionListeners,
}

impl ActionState {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            id: ActionId::next(),
            name,
            phase: Phase::Disabled,
            last_trigger: TriggerState::default(),
            listeners: ActionListeners::new(),
        }
    }

    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.phase != Phase::Disabled
    }

    /// Install a monitor for every resolved control and start waiting
    pub(crate) fn enable(&mut self, resolved: &[ResolvedBinding], backend: &mut Backend<'_>) {
        for (binding_index, binding) in resolved.iter().enumerate() {
            for control in &binding.controls {
                backend.monitors.install_monitor(*control, self.id, binding_index);
            }
        }
        self.phase = Phase::Waiting;
        log::info!("Action '{}' enabled", self.display_name());
    }

    /// Remove monitors, reset modifiers (cancelling timers) and go dormant
    pub(crate) fn disable(&mut self, resolved: &mut [ResolvedBinding], backend: &mut Backend<'_>) {
        for binding_index in 0..resolved.len() {
            for control in &resolved[binding_index].controls {
                backend.monitors.remove_monitor(*control, self.id);
            }
            for modifier_index in 0..resolved[binding_index].modifiers.len() {
                self.reset_modifier(resolved, binding_index, modifier_index, backend);
            }
        }
        self.last_trigger = TriggerState::default();
        self.phase = Phase::Disabled;
        log::info!("Action '{}' disabled", self.display_name());
    }

    /// A monitored control of `binding_index` changed value
    pub(crate) fn notify_value_changed(
        &mut self,
        resolved: &mut [ResolvedBinding],
        control: InputSource,
        binding_index: usize,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Err(InputError::InvalidState(format!(
                "action '{}' received a value change while disabled",
                self.display_name()
            )));
        }
        let binding = resolved.get(binding_index).ok_or_else(|| {
            InputError::InvalidState(format!(
                "action '{}' has no binding {}",
                self.display_name(),
                binding_index
            ))
        })?;
        log::trace!(
            "Action '{}': {} changed at {:.3}s (binding {})",
            self.display_name(),
            control,
            time,
            binding_index
        );

        // Without modifiers every change, release included, is a full cycle
        if !binding.has_modifiers() {
            let trigger = TriggerState {
                phase: Phase::Performed,
                time,
                start_time: time,
                control: Some(control),
                binding_index: None,
                modifier_index: None,
            };
            return self.change_phase(Phase::Performed, trigger);
        }

        let at_default = backend.controls.is_at_default(control);
        for modifier_index in 0..binding.modifiers.len() {
            self.process_modifier(
                resolved,
                binding_index,
                modifier_index,
                Some(control),
                time,
                at_default,
                false,
                backend,
            )?;
        }
        Ok(())
    }

    /// A timeout scheduled by a modifier has fired
    ///
    /// Stale expiries (modifier reset since scheduling) are ignored.
    pub(crate) fn notify_timer_expired(
        &mut self,
        resolved: &mut [ResolvedBinding],
        binding_index: usize,
        modifier_index: usize,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let Some(state) = resolved
            .get_mut(binding_index)
            .and_then(|b| b.modifiers.get_mut(modifier_index))
        else {
            log::trace!(
                "Action '{}': expiry for unknown modifier {}/{}",
                self.display_name(),
                binding_index,
                modifier_index
            );
            return Ok(());
        };
        if !state.is_timer_running {
            log::trace!(
                "Action '{}': stale expiry for modifier {}/{}",
                self.display_name(),
                binding_index,
                modifier_index
            );
            return Ok(());
        }
        state.is_timer_running = false;

        let control = state.driving_control;
        let at_default = control
            .map(|c| backend.controls.is_at_default(c))
            .unwrap_or(true);
        self.process_modifier(
            resolved,
            binding_index,
            modifier_index,
            control,
            time,
            at_default,
            true,
            backend,
        )
    }

    /// Run one modifier and apply what it asked for, in order
    #[allow(clippy::too_many_arguments)]
    fn process_modifier(
        &mut self,
        resolved: &mut [ResolvedBinding],
        binding_index: usize,
        modifier_index: usize,
        control: Option<InputSource>,
        time: f64,
        at_default: bool,
        timer_has_expired: bool,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let state = &mut resolved[binding_index].modifiers[modifier_index];
        let mut context = ModifierContext::new(
            state.phase,
            time,
            state.start_time,
            control.or(state.driving_control),
            at_default,
            timer_has_expired,
        );
        state.modifier.process(&mut context);
        let requests = context.into_requests();
        self.check_requests(state, &requests, binding_index, modifier_index)?;

        for request in requests {
            let phase = match request {
                ModifierRequest::SetTimeout(seconds) => {
                    self.set_timeout(
                        resolved,
                        binding_index,
                        modifier_index,
                        time + seconds,
                        backend,
                    )?;
                    continue;
                }
                ModifierRequest::Started => Phase::Started,
                ModifierRequest::Performed => Phase::Performed,
                ModifierRequest::Cancelled => Phase::Cancelled,
            };
            self.change_phase_of_modifier(
                resolved,
                binding_index,
                modifier_index,
                phase,
                control,
                time,
                backend,
            )?;
        }
        Ok(())
    }

    /// Reject the whole request list if any step would be illegal for the
    /// modifier, so a failing `process` leaves nothing half-applied
    fn check_requests(
        &self,
        state: &ModifierState,
        requests: &[ModifierRequest],
        binding_index: usize,
        modifier_index: usize,
    ) -> Result<()> {
        let mut phase = state.phase;
        let mut timer_running = state.is_timer_running;
        for request in requests {
            let next = match request {
                ModifierRequest::SetTimeout(_) => {
                    if timer_running {
                        return Err(self.double_timeout_error(state, binding_index, modifier_index));
                    }
                    timer_running = true;
                    continue;
                }
                ModifierRequest::Started => Phase::Started,
                ModifierRequest::Performed => Phase::Performed,
                ModifierRequest::Cancelled => Phase::Cancelled,
            };
            if !phase.can_transition_to(next) {
                return Err(InputError::InvalidPhaseTransition {
                    action: self.display_name().to_string(),
                    from: phase,
                    to: next,
                    binding_index: Some(binding_index),
                    modifier_index: Some(modifier_index),
                });
            }
            // Terminal phases reset the modifier, which also drops its timer
            if next.is_terminal() {
                phase = Phase::Waiting;
                timer_running = false;
            } else {
                phase = next;
            }
        }
        Ok(())
    }

    fn double_timeout_error(
        &self,
        state: &ModifierState,
        binding_index: usize,
        modifier_index: usize,
    ) -> InputError {
        InputError::NotSupported(format!(
            "modifier '{}' ({}/{}) of action '{}' already has a timeout pending",
            state.name(),
            binding_index,
            modifier_index,
            self.display_name()
        ))
    }

    fn set_timeout(
        &mut self,
        resolved: &mut [ResolvedBinding],
        binding_index: usize,
        modifier_index: usize,
        wake_time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let state = &mut resolved[binding_index].modifiers[modifier_index];
        if state.is_timer_running {
            return Err(self.double_timeout_error(state, binding_index, modifier_index));
        }
        state.is_timer_running = true;
        backend
            .timeouts
            .schedule_timeout(self.id, binding_index, modifier_index, wake_time);
        Ok(())
    }

    /// Move a modifier to `new_phase` and arbitrate what that means for the action
    #[allow(clippy::too_many_arguments)]
    fn change_phase_of_modifier(
        &mut self,
        resolved: &mut [ResolvedBinding],
        binding_index: usize,
        modifier_index: usize,
        new_phase: Phase,
        control: Option<InputSource>,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let state = &mut resolved[binding_index].modifiers[modifier_index];
        let previous = state.phase;
        if !previous.can_transition_to(new_phase) {
            return Err(InputError::InvalidPhaseTransition {
                action: self.display_name().to_string(),
                from: previous,
                to: new_phase,
                binding_index: Some(binding_index),
                modifier_index: Some(modifier_index),
            });
        }

        state.phase = new_phase;
        if control.is_some() {
            state.driving_control = control;
        }
        if new_phase == Phase::Started || previous == Phase::Waiting {
            state.start_time = time;
        }
        let trigger = TriggerState {
            phase: new_phase,
            time,
            start_time: state.start_time,
            control: state.driving_control,
            binding_index: Some(binding_index),
            modifier_index: Some(modifier_index),
        };

        let is_driver = self.last_trigger.binding_index == Some(binding_index)
            && self.last_trigger.modifier_index == Some(modifier_index);

        if self.phase == Phase::Waiting {
            // First modifier to leave waiting drives the action. A cancel from
            // a modifier that never drove it has nothing to cancel.
            if new_phase != Phase::Cancelled {
                self.change_phase(new_phase, trigger)?;
            }
        } else if is_driver {
            self.change_phase(new_phase, trigger)?;
            if new_phase == Phase::Cancelled {
                self.promote_started_modifier(resolved, binding_index, modifier_index, time)?;
            }
        } else if new_phase == Phase::Performed {
            // A performing modifier wins the cycle even if another one started it
            self.change_phase(new_phase, trigger)?;
        }

        if new_phase == Phase::Performed {
            for other in 0..resolved[binding_index].modifiers.len() {
                if other != modifier_index {
                    self.reset_modifier(resolved, binding_index, other, backend);
                }
            }
        }
        if new_phase.is_terminal() {
            self.reset_modifier(resolved, binding_index, modifier_index, backend);
        }
        Ok(())
    }

    /// After the driver cancelled, hand the action to the next started modifier
    fn promote_started_modifier(
        &mut self,
        resolved: &[ResolvedBinding],
        binding_index: usize,
        cancelled_index: usize,
        time: f64,
    ) -> Result<()> {
        let next = resolved[binding_index]
            .modifiers
            .iter()
            .enumerate()
            .find(|(index, state)| *index != cancelled_index && state.phase == Phase::Started);

        if let Some((modifier_index, state)) = next {
            log::debug!(
                "Action '{}': modifier '{}' takes over after cancel",
                self.display_name(),
                state.name()
            );
            let trigger = TriggerState {
                phase: Phase::Started,
                time,
                start_time: state.start_time,
                control: state.driving_control,
                binding_index: Some(binding_index),
                modifier_index: Some(modifier_index),
            };
            self.change_phase(Phase::Started, trigger)?;
        }
        Ok(())
    }

    fn reset_modifier(
        &mut self,
        resolved: &mut [ResolvedBinding],
        binding_index: usize,
        modifier_index: usize,
        backend: &mut Backend<'_>,
    ) {
        if resolved[binding_index].modifiers[modifier_index].reset() {
            backend
                .timeouts
                .cancel_timeout(self.id, binding_index, modifier_index);
        }
    }

    /// Perform a transition of the action itself and notify listeners
    ///
    /// Terminal phases fall back to `Waiting` before returning.
    pub(crate) fn change_phase(&mut self, new_phase: Phase, trigger: TriggerState) -> Result<()> {
        if !self.phase.can_transition_to(new_phase) {
            return Err(InputError::InvalidPhaseTransition {
                action: self.display_name().to_string(),
                from: self.phase,
                to: new_phase,
                binding_index: trigger.binding_index,
                modifier_index: trigger.modifier_index,
            });
        }

        let trigger = TriggerState {
            phase: new_phase,
            ..trigger
        };
        log::debug!(
            "Action '{}': {} -> {} at {:.3}s",
            self.display_name(),
            self.phase,
            new_phase,
            trigger.time
        );
        self.phase = new_phase;
        self.last_trigger = trigger;

        let context = CallbackContext {
            action: self.id,
            action_name: self.name.as_deref(),
            trigger,
        };
        self.listeners.fire(&context);

        if new_phase.is_terminal() {
            self.phase = Phase::Waiting;
        }
        Ok(())
    }
}
