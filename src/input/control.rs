// Input sources and the control namespace bindings resolve against

use std::collections::HashMap;
use std::fmt;

use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Represents a concrete input source (keyboard key or mouse button)
///
/// This is the opaque handle bindings resolve to and monitors are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Keyboard(KeyCode),
    Mouse(MouseButton),
}

impl InputSource {
    /// Create a keyboard input source
    pub fn key(code: KeyCode) -> Self {
        Self::Keyboard(code)
    }

    /// Create a mouse button input source
    pub fn mouse(button: MouseButton) -> Self {
        Self::Mouse(button)
    }

    /// Canonical path of this source, e.g. `<Keyboard>/space`
    pub fn path(&self) -> String {
        match self {
            Self::Keyboard(code) => KEYBOARD_CONTROLS
                .iter()
                .find(|(_, c)| c == code)
                .map(|(name, _)| format!("<{}>/{}", KEYBOARD, name))
                .unwrap_or_else(|| format!("<{}>/{:?}", KEYBOARD, code)),
            Self::Mouse(button) => MOUSE_CONTROLS
                .iter()
                .find(|(_, b)| b == button)
                .map(|(name, _)| format!("<{}>/{}", MOUSE, name))
                .unwrap_or_else(|| format!("<{}>/{:?}", MOUSE, button)),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Lookup side of the device layer
pub trait ControlNamespace {
    /// Resolve a path expression to zero or more sources
    fn resolve_path(&self, expression: &str) -> Vec<InputSource>;

    /// Check whether a source currently sits at its rest value
    fn is_at_default(&self, source: InputSource) -> bool;
}

const KEYBOARD: &str = "Keyboard";
const MOUSE: &str = "Mouse";

const KEYBOARD_CONTROLS: &[(&str, KeyCode)] = &[
    ("a", KeyCode::KeyA),
    ("b", KeyCode::KeyB),
    ("c", KeyCode::KeyC),
    ("d", KeyCode::KeyD),
    ("e", KeyCode::KeyE),
    ("f", KeyCode::KeyF),
    ("g", KeyCode::KeyG),
    ("h", KeyCode::KeyH),
    ("i", KeyCode::KeyI),
    ("j", KeyCode::KeyJ),
    ("k", KeyCode::KeyK),
    ("l", KeyCode::KeyL),
    ("m", KeyCode::KeyM),
    ("n", KeyCode::KeyN),
    ("o", KeyCode::KeyO),
    ("p", KeyCode::KeyP),
    ("q", KeyCode::KeyQ),
    ("r", KeyCode::KeyR),
    ("s", KeyCode::KeyS),
    ("t", KeyCode::KeyT),
    ("u", KeyCode::KeyU),
    ("v", KeyCode::KeyV),
    ("w", KeyCode::KeyW),
    ("x", KeyCode::KeyX),
    ("y", KeyCode::KeyY),
    ("z", KeyCode::KeyZ),
    ("0", KeyCode::Digit0),
    ("1", KeyCode::Digit1),
    ("2", KeyCode::Digit2),
    ("3", KeyCode::Digit3),
    ("4", KeyCode::Digit4),
    ("5", KeyCode::Digit5),
    ("6", KeyCode::Digit6),
    ("7", KeyCode::Digit7),
    ("8", KeyCode::Digit8),
    ("9", KeyCode::Digit9),
    ("space", KeyCode::Space),
    ("enter", KeyCode::Enter),
    ("escape", KeyCode::Escape),
    ("tab", KeyCode::Tab),
    ("backspace", KeyCode::Backspace),
    ("leftShift", KeyCode::ShiftLeft),
    ("rightShift", KeyCode::ShiftRight),
    ("leftCtrl", KeyCode::ControlLeft),
    ("rightCtrl", KeyCode::ControlRight),
    ("leftAlt", KeyCode::AltLeft),
    ("rightAlt", KeyCode::AltRight),
    ("upArrow", KeyCode::ArrowUp),
    ("downArrow", KeyCode::ArrowDown),
    ("leftArrow", KeyCode::ArrowLeft),
    ("rightArrow", KeyCode::ArrowRight),
    ("f1", KeyCode::F1),
    ("f2", KeyCode::F2),
    ("f3", KeyCode::F3),
    ("f4", KeyCode::F4),
    ("f5", KeyCode::F5),
    ("f6", KeyCode::F6),
    ("f7", KeyCode::F7),
    ("f8", KeyCode::F8),
    ("f9", KeyCode::F9),
    ("f10", KeyCode::F10),
    ("f11", KeyCode::F11),
    ("f12", KeyCode::F12),
];

const MOUSE_CONTROLS: &[(&str, MouseButton)] = &[
    ("leftButton", MouseButton::Left),
    ("rightButton", MouseButton::Right),
    ("middleButton", MouseButton::Middle),
    ("backButton", MouseButton::Back),
    ("forwardButton", MouseButton::Forward),
];

/// Current state of the keyboard and mouse, addressable by path
///
/// Values are whatever the event pump last wrote; decoding raw device
/// memory happens upstream.
#[derive(Debug)]
pub struct DeviceState {
    /// Lowercased device name, lowercased control name, source
    controls: Vec<(String, String, InputSource)>,

    /// Latest value per source; absent means rest
    values: HashMap<InputSource, f32>,

    /// Magnitudes at or below this count as "at default"
    press_threshold: f32,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::with_press_threshold(0.0)
    }

    pub fn with_press_threshold(press_threshold: f32) -> Self {
        let keyboard = KEYBOARD_CONTROLS.iter().map(|(name, code)| {
            (
                KEYBOARD.to_lowercase(),
                name.to_lowercase(),
                InputSource::key(*code),
            )
        });
        let mouse = MOUSE_CONTROLS.iter().map(|(name, button)| {
            (
                MOUSE.to_lowercase(),
                name.to_lowercase(),
                InputSource::mouse(*button),
            )
        });

        Self {
            controls: keyboard.chain(mouse).collect(),
            values: HashMap::new(),
            press_threshold,
        }
    }

    /// Record a new value for a source; returns whether it changed
    ///
    /// Non-finite values are dropped and the previous value is kept.
    pub fn set_value(&mut self, source: InputSource, value: f32) -> bool {
        if !value.is_finite() {
            log::warn!("Ignoring non-finite value {} for {}", value, source);
            return false;
        }
        let previous = self.value(source);
        if previous == value {
            return false;
        }
        if value == 0.0 {
            self.values.remove(&source);
        } else {
            self.values.insert(source, value);
        }
        true
    }

    /// Latest value of a source (0.0 if never written)
    pub fn value(&self, source: InputSource) -> f32 {
        self.values.get(&source).copied().unwrap_or(0.0)
    }

    /// Put every source back to rest
    pub fn reset(&mut self) {
        self.values.clear();
    }

    pub fn press_threshold(&self) -> f32 {
        self.press_threshold
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlNamespace for DeviceState {
    fn resolve_path(&self, expression: &str) -> Vec<InputSource> {
        let Some((device, control)) = split_path(expression) else {
            log::trace!("Path '{}' is not of the form <Device>/control", expression);
            return Vec::new();
        };
        let device = device.to_lowercase();
        let control = control.to_lowercase();

        self.controls
            .iter()
            .filter(|(d, _, _)| *d == device)
            .filter(|(_, c, _)| match control.strip_suffix('*') {
                Some(prefix) => c.starts_with(prefix),
                None => *c == control,
            })
            .map(|(_, _, source)| *source)
            .collect()
    }

    fn is_at_default(&self, source: InputSource) -> bool {
        self.value(source).abs() <= self.press_threshold
    }
}

/// Split `<Device>/control` into its two halves
fn split_path(expression: &str) -> Option<(&str, &str)> {
    let rest = expression.trim().strip_prefix('<')?;
    let (device, control) = rest.split_once(">/")?;
    if device.is_empty() || control.is_empty() {
        return None;
    }
    Some((device, control))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_source_keyboard_creation() {
        let source = InputSource::key(KeyCode::KeyA);
        assert_eq!(source, InputSource::Keyboard(KeyCode::KeyA));
    }

    #[test]
    fn test_input_source_path() {
        assert_eq!(InputSource::key(KeyCode::Space).path(), "<Keyboard>/space");
        assert_eq!(
            InputSource::mouse(MouseButton::Left).to_string(),
            "<Mouse>/leftButton"
        );
    }

    #[test]
    fn test_resolve_single_control() {
        let devices = DeviceState::new();
        assert_eq!(
            devices.resolve_path("<Keyboard>/space"),
            vec![InputSource::key(KeyCode::Space)]
        );
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let devices = DeviceState::new();
        assert_eq!(
            devices.resolve_path("<mouse>/LEFTBUTTON"),
            vec![InputSource::mouse(MouseButton::Left)]
        );
    }

    #[test]
    fn test_resolve_wildcard() {
        let devices = DeviceState::new();
        assert_eq!(devices.resolve_path("<Mouse>/*").len(), MOUSE_CONTROLS.len());

        let function_keys = devices.resolve_path("<Keyboard>/f1*");
        // f1, f10, f11, f12
        assert_eq!(function_keys.len(), 4);
        assert_eq!(function_keys[0], InputSource::key(KeyCode::F1));
    }

    #[test]
    fn test_resolve_unknown_is_empty() {
        let devices = DeviceState::new();
        assert!(devices.resolve_path("<Gamepad>/buttonSouth").is_empty());
        assert!(devices.resolve_path("<Keyboard>/nope").is_empty());
        assert!(devices.resolve_path("space").is_empty());
        assert!(devices.resolve_path("").is_empty());
    }

    #[test]
    fn test_default_tracking() {
        let mut devices = DeviceState::new();
        let space = InputSource::key(KeyCode::Space);
        assert!(devices.is_at_default(space));

        assert!(devices.set_value(space, 1.0));
        assert!(!devices.is_at_default(space));
        assert!(!devices.set_value(space, 1.0), "Same value is not a change");

        assert!(devices.set_value(space, 0.0));
        assert!(devices.is_at_default(space));
    }

    #[test]
    fn test_press_threshold() {
        let mut devices = DeviceState::with_press_threshold(0.5);
        let source = InputSource::mouse(MouseButton::Right);
        devices.set_value(source, 0.3);
        assert!(devices.is_at_default(source));
        devices.set_value(source, 0.8);
        assert!(!devices.is_at_default(source));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut devices = DeviceState::new();
        let source = InputSource::key(KeyCode::KeyE);

        assert!(!devices.set_value(source, f32::NAN));
        assert!(!devices.set_value(source, f32::NAN));
        assert!(devices.is_at_default(source));

        assert!(devices.set_value(source, 1.0));
        assert!(!devices.set_value(source, f32::NEG_INFINITY));
        assert_eq!(devices.value(source), 1.0);
        assert!(!devices.is_at_default(source));
    }

    #[test]
    fn test_reset() {
        let mut devices = DeviceState::new();
        let source = InputSource::key(KeyCode::KeyW);
        devices.set_value(source, 1.0);
        devices.reset();
        assert_eq!(devices.value(source), 0.0);
    }
}
