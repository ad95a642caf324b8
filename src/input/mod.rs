// Input action system
//
// This module turns raw keyboard and mouse state changes into phase-driven
// actions (Waiting -> Started -> Performed/Cancelled) that game code
// subscribes to, with optional modifiers recognising gestures such as hold,
// tap and slow tap.
//
// ## Architecture
//
// - `binding`: Declarative bindings, overrides and the arrays that own them
// - `control`: Input sources, control paths and device state
// - `resolver`: Turns bindings into resolved controls and modifier instances
// - `modifier`: The modifier trait, registry and built-in gestures
// - `engine`: Phase state machine and modifier arbitration
// - `action`: Standalone actions and the per-action API
// - `action_set`: Groups of actions sharing one binding array
// - `monitor`, `timeout`: Subscription and scheduling collaborators
// - `config`: Settings and the default gameplay layout
// - `manager`: Event pump wiring winit events into actions
//
// ## Usage Example
//
// ```rust
// use rusted_input::input::{config, InputManager, InputSettings};
//
// let mut manager = InputManager::new(InputSettings::default());
// let set = manager.add_set(config::default_gameplay_set()?);
// manager.enable_all()?;
//
// // In your event loop
// manager.process_keyboard_event(&key_event, now);
//
// // Once per frame, fire due hold/tap timeouts
// manager.update(now)?;
// ```

pub mod action;
pub mod action_set;
pub mod binding;
pub mod config;
pub mod control;
pub mod engine;
pub mod manager;
pub mod modifier;
pub mod monitor;
pub mod phase;
pub mod resolver;
pub mod timeout;
pub mod trigger;

// Re-export commonly used types
pub use action::{Action, ActionBindings, ActionId};
pub use action_set::ActionSet;
pub use binding::{Binding, BindingArray, BindingOverride, BindingWindow};
pub use config::InputSettings;
pub use control::{ControlNamespace, DeviceState, InputSource};
pub use engine::Backend;
pub use manager::InputManager;
pub use modifier::{Modifier, ModifierContext, ModifierRegistry};
pub use monitor::{ControlMonitor, MonitorRegistry};
pub use phase::Phase;
pub use resolver::{chain_ranges, ResolvedBinding};
pub use timeout::{Timeout, TimeoutQueue, TimeoutScheduler};
pub use trigger::{CallbackContext, ListenerId, TriggerState};

/// Input system errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(
        "Invalid phase transition for action '{action}': {from} -> {to} \
         (binding {binding_index:?}, modifier {modifier_index:?})"
    )]
    InvalidPhaseTransition {
        action: String,
        from: Phase,
        to: Phase,
        binding_index: Option<usize>,
        modifier_index: Option<usize>,
    },

    #[error("Action '{action}' has several bindings; an override needs a group")]
    AmbiguousOverride { action: String },

    #[error("No binding of action '{action}' matches group {group:?}")]
    NoMatchingBinding {
        action: String,
        group: Option<String>,
    },

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),

    #[error("Invalid parameter for modifier '{modifier}': {message}")]
    InvalidModifierParameter { modifier: String, message: String },

    #[error("Action not found: {0}")]
    ActionNotFound(String),
}

pub type Result<T> = std::result::Result<T, InputError>;
