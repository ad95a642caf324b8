// Trigger snapshots and listener lists

use std::fmt;

use super::action::ActionId;
use super::control::InputSource;
use super::phase::Phase;

/// Immutable record of one phase transition
///
/// `binding_index` and `modifier_index` are `None` when the transition came
/// from default (modifier-less) logic.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerState {
    pub phase: Phase,
    pub time: f64,
    pub start_time: f64,
    pub control: Option<InputSource>,
    pub binding_index: Option<usize>,
    pub modifier_index: Option<usize>,
}

impl TriggerState {
    /// Seconds between the start of the gesture and this transition
    pub fn duration(&self) -> f64 {
        self.time - self.start_time
    }

    /// Whether a modifier (rather than default logic) produced this trigger
    pub fn is_from_modifier(&self) -> bool {
        self.modifier_index.is_some()
    }
}

/// What a listener gets to see for one transition
#[derive(Debug, Clone, Copy)]
pub struct CallbackContext<'a> {
    pub action: ActionId,
    pub action_name: Option<&'a str>,
    pub trigger: TriggerState,
}

impl CallbackContext<'_> {
    pub fn phase(&self) -> Phase {
        self.trigger.phase
    }

    pub fn time(&self) -> f64 {
        self.trigger.time
    }

    pub fn start_time(&self) -> f64 {
        self.trigger.start_time
    }

    pub fn duration(&self) -> f64 {
        self.trigger.duration()
    }

    pub fn control(&self) -> Option<InputSource> {
        self.trigger.control
    }
}

/// Handle returned when registering a listener, used to remove it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&CallbackContext<'_>)>;

/// Ordered callback lists for the three observable phases
#[derive(Default)]
pub struct ActionListeners {
    next_id: u64,
    started: Vec<(ListenerId, Listener)>,
    performed: Vec<(ListenerId, Listener)>,
    cancelled: Vec<(ListenerId, Listener)>,
}

impl ActionListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `phase`; `None` if the phase is not observable
    pub fn add<F>(&mut self, phase: Phase, listener: F) -> Option<ListenerId>
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        match phase {
            Phase::Started => Some(self.on_started(listener)),
            Phase::Performed => Some(self.on_performed(listener)),
            Phase::Cancelled => Some(self.on_cancelled(listener)),
            Phase::Disabled | Phase::Waiting => None,
        }
    }

    pub fn on_started<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        push(&mut self.next_id, &mut self.started, Box::new(listener))
    }

    pub fn on_performed<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        push(&mut self.next_id, &mut self.performed, Box::new(listener))
    }

    pub fn on_cancelled<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CallbackContext<'_>) + 'static,
    {
        push(&mut self.next_id, &mut self.cancelled, Box::new(listener))
    }

    /// Remove a listener from whichever list holds it
    pub fn remove(&mut self, id: ListenerId) -> bool {
        for list in [&mut self.started, &mut self.performed, &mut self.cancelled] {
            if let Some(pos) = list.iter().position(|(lid, _)| *lid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Invoke listeners of `context.phase()` in registration order
    pub fn fire(&mut self, context: &CallbackContext<'_>) {
        if let Some(list) = self.list_mut(context.phase()) {
            for (_, listener) in list.iter_mut() {
                listener(context);
            }
        }
    }

    pub fn count(&self, phase: Phase) -> usize {
        match phase {
            Phase::Started => self.started.len(),
            Phase::Performed => self.performed.len(),
            Phase::Cancelled => self.cancelled.len(),
            Phase::Disabled | Phase::Waiting => 0,
        }
    }

    fn list_mut(&mut self, phase: Phase) -> Option<&mut Vec<(ListenerId, Listener)>> {
        match phase {
            Phase::Started => Some(&mut self.started),
            Phase::Performed => Some(&mut self.performed),
            Phase::Cancelled => Some(&mut self.cancelled),
            Phase::Disabled | Phase::Waiting => None,
        }
    }
}

fn push(next_id: &mut u64, list: &mut Vec<(ListenerId, Listener)>, listener: Listener) -> ListenerId {
    let id = ListenerId(*next_id);
    *next_id += 1;
    list.push((id, listener));
    id
}

impl fmt::Debug for ActionListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionListeners")
            .field("started", &self.started.len())
            .field("performed", &self.performed.len())
            .field("cancelled", &self.cancelled.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context(phase: Phase) -> CallbackContext<'static> {
        CallbackContext {
            action: ActionId::from_u64(7),
            action_name: Some("Jump"),
            trigger: TriggerState {
                phase,
                time: 1.5,
                start_time: 1.0,
                ..TriggerState::default()
            },
        }
    }

    #[test]
    fn test_duration() {
        assert!((context(Phase::Performed).duration() - 0.5).abs() < 1e-9);
        assert!(!TriggerState::default().is_from_modifier());
    }

    #[test]
    fn test_fire_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = ActionListeners::new();

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            listeners.add(Phase::Performed, move |_: &CallbackContext<'_>| {
                log.borrow_mut().push(tag)
            });
        }

        listeners.fire(&context(Phase::Performed));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_phases_have_separate_lists() {
        let hits = Rc::new(RefCell::new(0));
        let mut listeners = ActionListeners::new();
        let counter = Rc::clone(&hits);
        listeners.add(Phase::Started, move |_: &CallbackContext<'_>| {
            *counter.borrow_mut() += 1
        });

        listeners.fire(&context(Phase::Performed));
        assert_eq!(*hits.borrow(), 0);
        listeners.fire(&context(Phase::Started));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let mut listeners = ActionListeners::new();
        let id = listeners
            .add(Phase::Cancelled, |_: &CallbackContext<'_>| {})
            .unwrap();
        assert_eq!(listeners.count(Phase::Cancelled), 1);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        assert_eq!(listeners.count(Phase::Cancelled), 0);
    }

    #[test]
    fn test_waiting_is_not_observable() {
        let mut listeners = ActionListeners::new();
        assert!(listeners
            .add(Phase::Waiting, |_: &CallbackContext<'_>| {})
            .is_none());
    }
}
