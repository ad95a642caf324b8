// Actions: named, bindable, phase-driven inputs

use std::sync::atomic::{AtomicU64, Ordering};

use super::binding::{
    collect_overrides, find_binding_for_group, Binding, BindingArray, BindingOverride,
    BindingWindow, GroupLookupError,
};
use super::control::InputSource;
use super::engine::{ActionState, Backend};
use super::phase::Phase;
use super::resolver::{resolve_bindings, ResolvedBinding};
use super::trigger::{CallbackContext, ListenerId, TriggerState};
use super::{InputError, Result};

static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an action, used to key monitors and timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u64);

impl ActionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create an action ID from a raw u64
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Where an action's bindings live
#[derive(Debug)]
pub enum ActionBindings {
    /// Standalone action: owns its own private array
    Private(BindingArray),
    /// Member of a set: a window into the set's shared array
    Window(BindingWindow),
}

/// A named input action
///
/// Standalone actions are driven directly through the methods below. Actions
/// that belong to an [`ActionSet`](super::ActionSet) are driven through the
/// set; their binding and lifecycle methods here return `InvalidState`.
#[derive(Debug)]
pub struct Action {
    pub(crate) state: ActionState,
    pub(crate) bindings: ActionBindings,

    /// Set-owned action whose window must be re-resolved on next enable
    pub(crate) needs_resolve: bool,
}

impl Action {
    /// Create a standalone action
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: ActionState::new(Some(name.into())),
            bindings: ActionBindings::Private(BindingArray::new()),
            needs_resolve: false,
        }
    }

    /// Create a standalone action without a name
    pub fn unnamed() -> Self {
        Self {
            state: ActionState::new(None),
            bindings: ActionBindings::Private(BindingArray::new()),
            needs_resolve: false,
        }
    }

    pub(crate) fn in_window(name: Option<String>, window: BindingWindow) -> Self {
        Self {
            state: ActionState::new(name),
            bindings: ActionBindings::Window(window),
            needs_resolve: false,
        }
    }

    /// Builder form of [`Action::add_binding`] for fresh actions
    pub fn with_binding(mut self, binding: Binding) -> Self {
        if let ActionBindings::Private(array) = &mut self.bindings {
            array.bindings.push(binding);
            array.invalidate();
        }
        self
    }

    pub fn id(&self) -> ActionId {
        self.state.id
    }

    pub fn name(&self) -> Option<&str> {
        self.state.name.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Snapshot of the most recent transition (zeroed while disabled)
    pub fn last_trigger(&self) -> TriggerState {
        self.state.last_trigger
    }

    /// Whether this action belongs to a set
    pub fn is_in_set(&self) -> bool {
        matches!(self.bindings, ActionBindings::Window(_))
    }

    /// Window into the owning set's bindings, if any
    pub fn binding_window(&self) -> Option<BindingWindow> {
        match &self.bindings {
            ActionBindings::Window(window) => Some(*window),
            ActionBindings::Private(_) => None,
        }
    }

    /// Bindings of a standalone action (set members: see the set)
    pub fn bindings(&self) -> Option<&[Binding]> {
        match &self.bindings {
            ActionBindings::Private(array) => Some(array.bindings()),
            ActionBindings::Window(_) => None,
        }
    }

    pub fn on_started<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        self.state.listeners.on_started(listener)
    }

    pub fn on_performed<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        self.state.listeners.on_performed(listener)
    }

    pub fn on_cancelled<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        self.state.listeners.on_cancelled(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.state.listeners.remove(id)
    }

    pub fn listener_count(&self, phase: Phase) -> usize {
        self.state.listeners.count(phase)
    }

    /// Append a binding to a disabled standalone action
    pub fn add_binding(&mut self, binding: Binding) -> Result<()> {
        self.ensure_disabled("add a binding")?;
        let array = self.private_array_mut()?;
        let index = array.len();
        array.insert(index, binding);
        Ok(())
    }

    /// Redirect one binding to another path
    pub fn apply_override(&mut self, binding_override: &BindingOverride) -> Result<()> {
        self.ensure_disabled("apply a binding override")?;
        let name = self.state.display_name().to_string();
        let array = self.private_array_mut()?;
        apply_override_to(&mut array.bindings, &name, binding_override)?;
        array.invalidate();
        Ok(())
    }

    /// Drop the override of the binding picked by `group`
    pub fn remove_override(&mut self, group: Option<&str>) -> Result<()> {
        self.ensure_disabled("remove a binding override")?;
        let name = self.state.display_name().to_string();
        let array = self.private_array_mut()?;
        remove_override_from(&mut array.bindings, &name, group)?;
        array.invalidate();
        Ok(())
    }

    pub fn remove_all_overrides(&mut self) -> Result<()> {
        self.ensure_disabled("remove binding overrides")?;
        let array = self.private_array_mut()?;
        if clear_overrides(&mut array.bindings) {
            array.invalidate();
        }
        Ok(())
    }

    /// Overrides currently applied, in binding order
    pub fn binding_overrides(&self) -> Vec<BindingOverride> {
        match &self.bindings {
            ActionBindings::Private(array) => collect_overrides(array.bindings()),
            ActionBindings::Window(_) => Vec::new(),
        }
    }

    /// Resolve (if needed), install monitors and start waiting
    pub fn enable(&mut self, backend: &mut Backend<'_>) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }
        if self.is_in_set() {
            return Err(self.set_owned_error("enable"));
        }
        let ActionBindings::Private(array) = &mut self.bindings else {
            return Ok(());
        };
        let resolved = ensure_resolved(array, backend)?;
        self.state.enable(resolved, backend);
        Ok(())
    }

    /// Remove monitors and return to `Disabled`
    pub fn disable(&mut self, backend: &mut Backend<'_>) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if self.is_in_set() {
            return Err(self.set_owned_error("disable"));
        }
        let ActionBindings::Private(array) = &mut self.bindings else {
            return Ok(());
        };
        let resolved = array.resolved.as_deref_mut().unwrap_or_default();
        self.state.disable(resolved, backend);
        Ok(())
    }

    /// Resolved bindings of an enabled standalone action
    pub fn resolved_bindings(&self) -> Result<&[ResolvedBinding]> {
        self.ensure_enabled("read resolved bindings")?;
        match &self.bindings {
            ActionBindings::Private(array) => Ok(array.resolved.as_deref().unwrap_or_default()),
            ActionBindings::Window(_) => Err(self.set_owned_error("read resolved bindings")),
        }
    }

    /// Every control the action currently monitors
    pub fn controls(&self) -> Result<Vec<InputSource>> {
        Ok(flatten_controls(self.resolved_bindings()?))
    }

    /// Event-pump entry point: a monitored control changed
    pub fn notify_value_changed(
        &mut self,
        control: InputSource,
        binding_index: usize,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let resolved = private_resolved_mut(&mut self.bindings, &self.state)?;
        self.state
            .notify_value_changed(resolved, control, binding_index, time, backend)
    }

    /// Scheduler entry point: a modifier timeout fired
    pub fn notify_timer_expired(
        &mut self,
        binding_index: usize,
        modifier_index: usize,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let resolved = private_resolved_mut(&mut self.bindings, &self.state)?;
        self.state
            .notify_timer_expired(resolved, binding_index, modifier_index, time, backend)
    }

    fn private_array_mut(&mut self) -> Result<&mut BindingArray> {
        match &mut self.bindings {
            ActionBindings::Private(array) => Ok(array),
            ActionBindings::Window(_) => Err(InputError::InvalidState(format!(
                "bindings of action '{}' are owned by its set",
                self.state.display_name()
            ))),
        }
    }

    fn set_owned_error(&self, what: &str) -> InputError {
        InputError::InvalidState(format!(
            "cannot {} action '{}' directly; it belongs to a set",
            what,
            self.state.display_name()
        ))
    }

    pub(crate) fn ensure_disabled(&self, what: &str) -> Result<()> {
        if self.is_enabled() {
            return Err(InputError::InvalidState(format!(
                "cannot {} while action '{}' is enabled",
                what,
                self.state.display_name()
            )));
        }
        Ok(())
    }

    pub(crate) fn ensure_enabled(&self, what: &str) -> Result<()> {
        if !self.is_enabled() {
            return Err(InputError::InvalidState(format!(
                "cannot {} while action '{}' is disabled",
                what,
                self.state.display_name()
            )));
        }
        Ok(())
    }
}

fn private_resolved_mut<'a>(
    bindings: &'a mut ActionBindings,
    state: &ActionState,
) -> Result<&'a mut [ResolvedBinding]> {
    match bindings {
        ActionBindings::Private(array) => Ok(array.resolved.as_deref_mut().unwrap_or_default()),
        ActionBindings::Window(_) => Err(InputError::InvalidState(format!(
            "action '{}' belongs to a set; notify it through the set",
            state.display_name()
        ))),
    }
}

/// Resolve the whole array unless a resolution is already cached
pub(crate) fn ensure_resolved<'a>(
    array: &'a mut BindingArray,
    backend: &Backend<'_>,
) -> Result<&'a mut Vec<ResolvedBinding>> {
    if array.resolved.is_none() {
        let resolved = resolve_bindings(&array.bindings, backend.controls, backend.modifiers)?;
        array.resolved = Some(resolved);
    }
    Ok(array.resolved.get_or_insert_with(Vec::new))
}

pub(crate) fn flatten_controls(resolved: &[ResolvedBinding]) -> Vec<InputSource> {
    resolved
        .iter()
        .flat_map(|binding| binding.controls().iter().copied())
        .collect()
}

pub(crate) fn apply_override_to(
    bindings: &mut [Binding],
    action_name: &str,
    binding_override: &BindingOverride,
) -> Result<()> {
    let index = lookup(bindings, action_name, binding_override.group.as_deref())?;
    bindings[index].override_path = Some(binding_override.path.clone());
    log::debug!(
        "Action '{}': binding {} overridden with '{}'",
        action_name,
        index,
        binding_override.path
    );
    Ok(())
}

pub(crate) fn remove_override_from(
    bindings: &mut [Binding],
    action_name: &str,
    group: Option<&str>,
) -> Result<()> {
    let index = lookup(bindings, action_name, group)?;
    bindings[index].override_path = None;
    Ok(())
}

/// Returns whether anything was cleared
pub(crate) fn clear_overrides(bindings: &mut [Binding]) -> bool {
    let mut cleared = false;
    for binding in bindings.iter_mut() {
        cleared |= binding.override_path.take().is_some();
    }
    cleared
}

fn lookup(bindings: &[Binding], action_name: &str, group: Option<&str>) -> Result<usize> {
    find_binding_for_group(bindings, group).map_err(|err| match err {
        GroupLookupError::Ambiguous => InputError::AmbiguousOverride {
            action: action_name.to_string(),
        },
        GroupLookupError::NoMatch => InputError::NoMatchingBinding {
            action: action_name.to_string(),
            group: group.map(str::to_string),
        },
    })
}
