// State-change monitors: which (action, binding) pairs watch a source

use std::collections::HashMap;

use super::action::ActionId;
use super::control::InputSource;

/// Subscription side of the device layer
pub trait ControlMonitor {
    /// Start reporting changes of `source` to `action`'s binding
    fn install_monitor(&mut self, source: InputSource, action: ActionId, binding_index: usize);

    /// Stop reporting changes of `source` to `action` (all of its bindings)
    fn remove_monitor(&mut self, source: InputSource, action: ActionId);
}

/// In-memory monitor table used by [`InputManager`](super::InputManager)
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    monitors: HashMap<InputSource, Vec<(ActionId, usize)>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribers of a source, in installation order
    pub fn monitors_for(&self, source: InputSource) -> Vec<(ActionId, usize)> {
        self.monitors.get(&source).cloned().unwrap_or_default()
    }

    pub fn is_monitored(&self, source: InputSource) -> bool {
        self.monitors.contains_key(&source)
    }

    /// Number of monitors installed for an action
    pub fn count_for_action(&self, action: ActionId) -> usize {
        self.monitors
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|(id, _)| *id == action)
            .count()
    }

    /// Total number of installed monitors
    pub fn len(&self) -> usize {
        self.monitors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    pub fn clear(&mut self) {
        self.monitors.clear();
    }
}

impl ControlMonitor for MonitorRegistry {
    fn install_monitor(&mut self, source: InputSource, action: ActionId, binding_index: usize) {
        let entries = self.monitors.entry(source).or_default();
        if !entries.contains(&(action, binding_index)) {
            entries.push((action, binding_index));
        }
    }

    fn remove_monitor(&mut self, source: InputSource, action: ActionId) {
        if let Some(entries) = self.monitors.get_mut(&source) {
            entries.retain(|(id, _)| *id != action);
            if entries.is_empty() {
                self.monitors.remove(&source);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn test_install_and_lookup() {
        let mut registry = MonitorRegistry::new();
        let space = InputSource::key(KeyCode::Space);
        let jump = ActionId::from_u64(1);
        let fire = ActionId::from_u64(2);

        registry.install_monitor(space, jump, 0);
        registry.install_monitor(space, fire, 1);

        assert_eq!(registry.monitors_for(space), vec![(jump, 0), (fire, 1)]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_install_is_deduplicated() {
        let mut registry = MonitorRegistry::new();
        let space = InputSource::key(KeyCode::Space);
        let jump = ActionId::from_u64(1);

        registry.install_monitor(space, jump, 0);
        registry.install_monitor(space, jump, 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_drops_all_bindings_of_action() {
        let mut registry = MonitorRegistry::new();
        let space = InputSource::key(KeyCode::Space);
        let jump = ActionId::from_u64(1);
        let fire = ActionId::from_u64(2);

        registry.install_monitor(space, jump, 0);
        registry.install_monitor(space, jump, 1);
        registry.install_monitor(space, fire, 0);
        registry.remove_monitor(space, jump);

        assert_eq!(registry.monitors_for(space), vec![(fire, 0)]);
        assert_eq!(registry.count_for_action(jump), 0);

        registry.remove_monitor(space, fire);
        assert!(!registry.is_monitored(space));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = MonitorRegistry::new();
        registry.remove_monitor(InputSource::key(KeyCode::KeyQ), ActionId::from_u64(9));
        assert!(registry.is_empty());
    }
}
