// Hold: perform once the control has been actuated long enough

use super::{Modifier, ModifierContext, ModifierParams};
use crate::input::config::InputSettings;
use crate::input::Result;

/// Starts on press, performs after `duration` seconds of holding,
/// cancels when released early
#[derive(Debug, Clone, PartialEq)]
pub struct HoldModifier {
    duration: f64,
}

impl HoldModifier {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub(crate) fn from_params(
        params: &ModifierParams,
        settings: &InputSettings,
    ) -> Result<Box<dyn Modifier>> {
        params.expect_only(&["duration"])?;
        let duration = params
            .get_f64("duration")?
            .unwrap_or(settings.default_hold_time);
        Ok(Box::new(Self::new(duration)))
    }
}

impl Modifier for HoldModifier {
    fn process(&mut self, context: &mut ModifierContext) {
        if context.timer_has_expired() {
            if context.is_started() {
                context.performed();
            }
            return;
        }

        if context.is_waiting() && !context.control_has_default_value() {
            context.started();
            context.set_timeout(self.duration);
        } else if context.is_started() && context.control_has_default_value() {
            // Released before the hold time elapsed
            context.cancelled();
        }
    }

    fn name(&self) -> &'static str {
        "hold"
    }
}
