// Action sets: actions sharing one binding array

use super::action::{
    apply_override_to, clear_overrides, ensure_resolved, flatten_controls, remove_override_from,
    Action, ActionBindings, ActionId,
};
use super::binding::{collect_overrides, Binding, BindingArray, BindingOverride, BindingWindow};
use super::control::InputSource;
use super::engine::Backend;
use super::resolver::{resolve_bindings, ResolvedBinding};
use super::{InputError, Result};

/// A group of actions whose bindings live in one shared arena
///
/// Each member action holds a `(start, count)` window into the set's binding
/// array. Members are addressed by their index in the set.
#[derive(Debug)]
pub struct ActionSet {
    name: String,
    array: BindingArray,
    actions: Vec<Action>,
}

impl ActionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: BindingArray::new(),
            actions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an action with an empty window; returns its index in the set
    pub fn add_action(&mut self, name: impl Into<String>) -> usize {
        let window = BindingWindow::new(self.array.len(), 0);
        self.actions.push(Action::in_window(Some(name.into()), window));
        self.actions.len() - 1
    }

    pub fn action(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    /// Mutable access, e.g. for registering listeners
    pub fn action_mut(&mut self, index: usize) -> Option<&mut Action> {
        self.actions.get_mut(index)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Index of the first action with this name
    pub fn find_action(&self, name: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.name() == Some(name))
    }

    pub fn index_of(&self, id: ActionId) -> Option<usize> {
        self.actions.iter().position(|a| a.id() == id)
    }

    /// Whether any member is enabled
    pub fn is_any_enabled(&self) -> bool {
        self.actions.iter().any(Action::is_enabled)
    }

    /// The whole shared binding array
    pub fn bindings(&self) -> &[Binding] {
        self.array.bindings()
    }

    /// Bindings inside one action's window
    pub fn bindings_of(&self, index: usize) -> Result<&[Binding]> {
        let window = self.window(index)?;
        Ok(&self.array.bindings()[window.range()])
    }

    /// Add a binding to the end of an action's window
    ///
    /// Appends when the window is empty or already at the end of the array;
    /// otherwise inserts mid-array and shifts the windows of every other
    /// action starting at or after the insertion point.
    pub fn add_binding(&mut self, index: usize, binding: Binding) -> Result<()> {
        if let Some(enabled) = self.actions.iter().find(|a| a.is_enabled()) {
            return Err(InputError::InvalidState(format!(
                "cannot add a binding to set '{}' while action '{}' is enabled",
                self.name,
                enabled.state.display_name()
            )));
        }
        let mut window = self.window(index)?;
        let len = self.array.len();

        if window.count == 0 {
            window.start = len;
            self.array.insert(len, binding);
        } else if window.end() == len {
            self.array.insert(len, binding);
        } else {
            let at = window.end();
            self.array.insert(at, binding);
            for (other_index, other) in self.actions.iter_mut().enumerate() {
                if other_index == index {
                    continue;
                }
                if let ActionBindings::Window(other_window) = &mut other.bindings {
                    if other_window.start >= at {
                        other_window.start += 1;
                    }
                }
            }
        }
        window.count += 1;
        self.set_window(index, window);
        log::debug!(
            "Set '{}': action {} window is now {}..{}",
            self.name,
            index,
            window.start,
            window.end()
        );
        Ok(())
    }

    pub fn apply_override(&mut self, index: usize, binding_override: &BindingOverride) -> Result<()> {
        let (name, range) = self.prepare_override(index, "apply a binding override")?;
        apply_override_to(&mut self.array.bindings[range], &name, binding_override)?;
        self.actions[index].needs_resolve = true;
        Ok(())
    }

    pub fn remove_override(&mut self, index: usize, group: Option<&str>) -> Result<()> {
        let (name, range) = self.prepare_override(index, "remove a binding override")?;
        remove_override_from(&mut self.array.bindings[range], &name, group)?;
        self.actions[index].needs_resolve = true;
        Ok(())
    }

    pub fn remove_all_overrides(&mut self, index: usize) -> Result<()> {
        let (_, range) = self.prepare_override(index, "remove binding overrides")?;
        if clear_overrides(&mut self.array.bindings[range]) {
            self.actions[index].needs_resolve = true;
        }
        Ok(())
    }

    pub fn binding_overrides(&self, index: usize) -> Result<Vec<BindingOverride>> {
        Ok(collect_overrides(self.bindings_of(index)?))
    }

    /// Enable one member, resolving the shared array if needed
    pub fn enable_action(&mut self, index: usize, backend: &mut Backend<'_>) -> Result<()> {
        let window = self.window(index)?;
        let action = &mut self.actions[index];
        if action.is_enabled() {
            return Ok(());
        }

        // Overrides since the last enable only touch this window
        let fresh = if self.array.is_resolved() && action.needs_resolve {
            Some(resolve_bindings(
                &self.array.bindings[window.range()],
                backend.controls,
                backend.modifiers,
            )?)
        } else {
            None
        };
        let resolved = ensure_resolved(&mut self.array, backend)?;
        if let Some(fresh) = fresh {
            for (slot, binding) in resolved[window.range()].iter_mut().zip(fresh) {
                *slot = binding;
            }
        }
        action.needs_resolve = false;

        action.state.enable(&resolved[window.range()], backend);
        Ok(())
    }

    pub fn disable_action(&mut self, index: usize, backend: &mut Backend<'_>) -> Result<()> {
        let window = self.window(index)?;
        let action = &mut self.actions[index];
        if !action.is_enabled() {
            return Ok(());
        }
        let resolved = self.array.resolved.as_deref_mut().unwrap_or_default();
        let slice = resolved.get_mut(window.range()).unwrap_or_default();
        action.state.disable(slice, backend);
        Ok(())
    }

    /// Enable every member
    pub fn enable(&mut self, backend: &mut Backend<'_>) -> Result<()> {
        for index in 0..self.actions.len() {
            self.enable_action(index, backend)?;
        }
        log::info!("Action set '{}' enabled", self.name);
        Ok(())
    }

    /// Disable every member
    pub fn disable(&mut self, backend: &mut Backend<'_>) -> Result<()> {
        for index in 0..self.actions.len() {
            self.disable_action(index, backend)?;
        }
        log::info!("Action set '{}' disabled", self.name);
        Ok(())
    }

    pub fn resolved_bindings_of(&self, index: usize) -> Result<&[ResolvedBinding]> {
        let window = self.window(index)?;
        self.actions[index].ensure_enabled("read resolved bindings")?;
        let resolved = self.array.resolved.as_deref().unwrap_or_default();
        Ok(resolved.get(window.range()).unwrap_or_default())
    }

    pub fn controls_of(&self, index: usize) -> Result<Vec<InputSource>> {
        Ok(flatten_controls(self.resolved_bindings_of(index)?))
    }

    /// Value change for a member; `binding_index` is relative to its window
    pub fn notify_value_changed(
        &mut self,
        index: usize,
        control: InputSource,
        binding_index: usize,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let window = self.window(index)?;
        let resolved = self.array.resolved.as_deref_mut().unwrap_or_default();
        let slice = resolved.get_mut(window.range()).unwrap_or_default();
        self.actions[index]
            .state
            .notify_value_changed(slice, control, binding_index, time, backend)
    }

    pub fn notify_timer_expired(
        &mut self,
        index: usize,
        binding_index: usize,
        modifier_index: usize,
        time: f64,
        backend: &mut Backend<'_>,
    ) -> Result<()> {
        let window = self.window(index)?;
        let resolved = self.array.resolved.as_deref_mut().unwrap_or_default();
        let slice = resolved.get_mut(window.range()).unwrap_or_default();
        self.actions[index].state.notify_timer_expired(
            slice,
            binding_index,
            modifier_index,
            time,
            backend,
        )
    }

    fn window(&self, index: usize) -> Result<BindingWindow> {
        match self.actions.get(index).map(|a| &a.bindings) {
            Some(ActionBindings::Window(window)) => Ok(*window),
            Some(ActionBindings::Private(_)) | None => Err(InputError::ActionNotFound(format!(
                "set '{}' has no action {}",
                self.name, index
            ))),
        }
    }

    fn set_window(&mut self, index: usize, window: BindingWindow) {
        if let Some(ActionBindings::Window(current)) =
            self.actions.get_mut(index).map(|a| &mut a.bindings)
        {
            *current = window;
        }
    }

    fn prepare_override(
        &self,
        index: usize,
        what: &str,
    ) -> Result<(String, std::ops::Range<usize>)> {
        let window = self.window(index)?;
        let action = &self.actions[index];
        action.ensure_disabled(what)?;
        Ok((action.state.display_name().to_string(), window.range()))
    }
}
