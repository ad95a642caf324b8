// Rusted Input - change-driven input actions for winit games

pub mod input;

pub use input::{
    Action, ActionId, ActionSet, Binding, BindingOverride, InputError, InputManager,
    InputSettings, InputSource, Phase,
};
