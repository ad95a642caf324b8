// Slow tap: press, hold at least a while, then release

use super::{Modifier, ModifierContext, ModifierParams};
use crate::input::config::InputSettings;
use crate::input::Result;

/// Starts on press; on release performs if held for at least `duration`,
/// otherwise cancels. Needs no timer.
#[derive(Debug, Clone, PartialEq)]
pub struct SlowTapModifier {
    duration: f64,
}

impl SlowTapModifier {
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
            .unwrap_or(settings.default_slow_tap_time);
        Ok(Box::new(Self::new(duration)))
    }
}

impl Modifier for SlowTapModifier {
    fn process(&mut self, context: &mut ModifierContext) {
        if context.is_waiting() && !context.control_has_default_value() {
            context.started();
        } else if context.is_started() && context.control_has_default_value() {
            if context.elapsed() >= self.duration {
                context.performed();
            } else {
                context.cancelled();
            }
        }
    }

    fn name(&self) -> &'static str {
        "slowtap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::modifier::ModifierRequest;
    use crate::input::phase::Phase;

    fn run(phase: Phase, time: f64, at_default: bool) -> Vec<ModifierRequest> {
        let mut slow_tap = SlowTapModifier::new(0.5);
        let mut context = ModifierContext::new(phase, time, 0.0, None, at_default, false);
        slow_tap.process(&mut context);
        context.into_requests()
    }

    #[test]
    fn test_press_starts_without_timer() {
        assert_eq!(
            run(Phase::Waiting, 0.0, false),
            vec![ModifierRequest::Started]
        );
    }

    #[test]
    fn test_long_press_performs() {
        assert_eq!(
            run(Phase::Started, 0.7, true),
            vec![ModifierRequest::Performed]
        );
    }

    #[test]
    fn test_short_press_cancels() {
        assert_eq!(
            run(Phase::Started, 0.1, true),
            vec![ModifierRequest::Cancelled]
        );
    }

    #[test]
    fn test_param_override() {
        let params = crate::input::modifier::parse_descriptor("slowtap(duration=2)").unwrap();
        let modifier =
            SlowTapModifier::from_params(&params[0], &InputSettings::default()).unwrap();
        assert_eq!(modifier.name(), "slowtap");
    }
}
