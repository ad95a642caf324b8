// Binding resolution: declarative bindings -> monitored sources + modifier slots

use std::ops::Range;

use super::binding::Binding;
use super::control::{ControlNamespace, InputSource};
use super::modifier::{Modifier, ModifierRegistry};
use super::phase::Phase;
use super::Result;

/// Runtime slot for one modifier of one binding
#[derive(Debug)]
pub struct ModifierState {
    pub(crate) modifier: Box<dyn Modifier>,
    pub(crate) phase: Phase,
    pub(crate) start_time: f64,
    pub(crate) driving_control: Option<InputSource>,
    pub(crate) is_timer_running: bool,
}

impl ModifierState {
    pub(crate) fn new(modifier: Box<dyn Modifier>) -> Self {
        Self {
            modifier,
            phase: Phase::Waiting,
            start_time: 0.0,
            driving_control: None,
            is_timer_running: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.modifier.name()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn driving_control(&self) -> Option<InputSource> {
        self.driving_control
    }

    pub fn is_timer_running(&self) -> bool {
        self.is_timer_running
    }

    /// Back to waiting with cleared gesture state.
    /// Returns whether a timeout was pending and must be cancelled.
    pub(crate) fn reset(&mut self) -> bool {
        self.modifier.reset();
        self.phase = Phase::Waiting;
        self.start_time = 0.0;
        self.driving_control = None;
        std::mem::replace(&mut self.is_timer_running, false)
    }
}

/// Concrete materialization of one binding
#[derive(Debug)]
pub struct ResolvedBinding {
    pub(crate) controls: Vec<InputSource>,
    pub(crate) modifiers: Vec<ModifierState>,
    pub(crate) combine_with_previous: bool,
}

impl ResolvedBinding {
    /// Resolve one binding against the namespace
    ///
    /// A path matching nothing yields an empty control list, not an error.
    pub fn resolve(
        binding: &Binding,
        namespace: &dyn ControlNamespace,
        registry: &ModifierRegistry,
    ) -> Result<Self> {
        let controls = namespace.resolve_path(binding.effective_path());
        let modifiers = match binding.modifiers.as_deref() {
            Some(descriptor) => registry
                .instantiate(descriptor)?
                .into_iter()
                .map(ModifierState::new)
                .collect(),
            None => Vec::new(),
        };

        log::debug!(
            "Resolved '{}' to {} control(s), {} modifier(s)",
            binding.effective_path(),
            controls.len(),
            modifiers.len()
        );

        Ok(Self {
            controls,
            modifiers,
            combine_with_previous: binding.combine_with_previous,
        })
    }

    pub fn controls(&self) -> &[InputSource] {
        &self.controls
    }

    pub fn modifiers(&self) -> &[ModifierState] {
        &self.modifiers
    }

    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }

    pub fn combine_with_previous(&self) -> bool {
        self.combine_with_previous
    }

    pub fn modifier_names(&self) -> Vec<&'static str> {
        self.modifiers.iter().map(ModifierState::name).collect()
    }
}

/// Resolve every binding in declaration order
pub fn resolve_bindings(
    bindings: &[Binding],
    namespace: &dyn ControlNamespace,
    registry: &ModifierRegistry,
) -> Result<Vec<ResolvedBinding>> {
    bindings
        .iter()
        .map(|binding| ResolvedBinding::resolve(binding, namespace, registry))
        .collect()
}

/// Split resolved bindings into positional composite groups
///
/// A binding flagged `combine_with_previous` joins the group of the binding
/// before it; every other binding opens a new group.
pub fn chain_ranges(resolved: &[ResolvedBinding]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (index, binding) in resolved.iter().enumerate() {
        match ranges.last_mut() {
            Some(last) if binding.combine_with_previous => last.end = index + 1,
            _ => ranges.push(index..index + 1),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::control::DeviceState;
    use crate::input::modifier::HoldModifier;
    use winit::keyboard::KeyCode;

    fn resolve(bindings: &[Binding]) -> Vec<ResolvedBinding> {
        resolve_bindings(bindings, &DeviceState::new(), &ModifierRegistry::default()).unwrap()
    }

    #[test]
    fn test_resolve_plain_binding() {
        let resolved = resolve(&[Binding::new("<Keyboard>/space")]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].controls(), &[InputSource::key(KeyCode::Space)]);
        assert!(!resolved[0].has_modifiers());
    }

    #[test]
    fn test_resolve_uses_override() {
        let mut binding = Binding::new("<Keyboard>/space");
        binding.override_path = Some("<Keyboard>/enter".to_string());
        let resolved = resolve(&[binding]);
        assert_eq!(resolved[0].controls(), &[InputSource::key(KeyCode::Enter)]);
    }

    #[test]
    fn test_unresolvable_path_is_empty_not_error() {
        let resolved = resolve(&[Binding::new("<Gamepad>/buttonSouth")]);
        assert!(resolved[0].controls().is_empty());
    }

    #[test]
    fn test_modifier_slots_start_waiting() {
        let resolved = resolve(&[Binding::new("<Keyboard>/space").with_modifiers("tap,hold")]);
        assert_eq!(resolved[0].modifier_names(), vec!["tap", "hold"]);
        for state in resolved[0].modifiers() {
            assert_eq!(state.phase(), Phase::Waiting);
            assert!(!state.is_timer_running());
            assert!(state.driving_control().is_none());
        }
    }

    #[test]
    fn test_empty_descriptor_means_no_modifiers() {
        let resolved = resolve(&[Binding::new("<Keyboard>/space").with_modifiers("")]);
        assert!(!resolved[0].has_modifiers());
    }

    #[test]
    fn test_unknown_modifier_fails_resolution() {
        let result = resolve_bindings(
            &[Binding::new("<Keyboard>/space").with_modifiers("wiggle")],
            &DeviceState::new(),
            &ModifierRegistry::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_combined_bindings_resolve_independently() {
        let resolved = resolve(&[
            Binding::new("<Keyboard>/a"),
            Binding::new("<Keyboard>/d").combined(),
            Binding::new("<Keyboard>/space"),
        ]);
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[1].controls(), &[InputSource::key(KeyCode::KeyD)]);
        assert!(resolved[1].combine_with_previous());
    }

    #[test]
    fn test_chain_ranges() {
        let resolved = resolve(&[
            Binding::new("<Keyboard>/w"),
            Binding::new("<Keyboard>/s").combined(),
            Binding::new("<Keyboard>/a").combined(),
            Binding::new("<Keyboard>/space"),
            Binding::new("<Keyboard>/d").combined(),
        ]);
        assert_eq!(chain_ranges(&resolved), vec![0..3, 3..5]);
    }

    #[test]
    fn test_chain_ranges_leading_combined() {
        // A leading combined flag has nothing to join
        let resolved = resolve(&[Binding::new("<Keyboard>/w").combined()]);
        assert_eq!(chain_ranges(&resolved), vec![0..1]);
    }

    #[test]
    fn test_modifier_state_reset() {
        let mut state = ModifierState::new(Box::new(HoldModifier::new(0.4)));
        state.phase = Phase::Started;
        state.start_time = 2.0;
        state.driving_control = Some(InputSource::key(KeyCode::Space));
        state.is_timer_running = true;

        assert!(state.reset(), "Pending timer must be reported");
        assert_eq!(state.phase(), Phase::Waiting);
        assert_eq!(state.start_time(), 0.0);
        assert!(state.driving_control().is_none());
        assert!(!state.reset());
    }
}
