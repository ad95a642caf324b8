// Input settings and default action layout

use super::action_set::ActionSet;
use super::binding::Binding;
use super::Result;

/// Tunables shared by the modifier registry and device state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSettings {
    /// Seconds a `hold` must last when its descriptor gives no duration
    pub default_hold_time: f64,

    /// Longest press a `tap` accepts by default
    pub default_tap_time: f64,

    /// Shortest press a `slowtap` accepts by default
    pub default_slow_tap_time: f64,

    /// Magnitudes at or below this count as "at rest"
    pub press_threshold: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            default_hold_time: 0.4,
            default_tap_time: 0.2,
            default_slow_tap_time: 0.5,
            press_threshold: 0.0,
        }
    }
}

/// Default keyboard/mouse layout for gameplay
pub fn default_gameplay_set() -> Result<ActionSet> {
    let mut set = ActionSet::new("Gameplay");

    let jump = set.add_action("Jump");
    set.add_binding(jump, Binding::new("<Keyboard>/space").with_group("Keyboard"))?;
    set.add_binding(jump, Binding::new("<Keyboard>/w").with_group("Keyboard"))?;

    // Movement (A/D read together as one axis)
    let movement = set.add_action("Move");
    set.add_binding(movement, Binding::new("<Keyboard>/a"))?;
    set.add_binding(movement, Binding::new("<Keyboard>/d").combined())?;

    // Quick click fires, long click fires a heavy shot
    let fire = set.add_action("Fire");
    set.add_binding(
        fire,
        Binding::new("<Mouse>/leftButton")
            .with_modifiers("tap,slowtap")
            .with_group("Mouse"),
    )?;

    let charge = set.add_action("Charge");
    set.add_binding(charge, Binding::new("<Keyboard>/e").with_modifiers("hold"))?;

    let menu = set.add_action("Menu");
    set.add_binding(menu, Binding::new("<Keyboard>/escape"))?;

    Ok(set)
}
