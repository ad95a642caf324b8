// Tap: press and release within a short window

use super::{Modifier, ModifierContext, ModifierParams};
use crate::input::config::InputSettings;
use crate::input::Result;

/// Starts on press, performs if released within `duration`, cancels
/// once the control has been held past it
#[derive(Debug, Clone, PartialEq)]
pub struct TapModifier {
    duration: f64,
}

impl TapModifier {
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
            .unwrap_or(settings.default_tap_time);
        Ok(Box::new(Self::new(duration)))
    }
}

impl Modifier for TapModifier {
    fn process(&mut self, context: &mut ModifierContext) {
        if context.timer_has_expired() {
            if context.is_started() {
                context.cancelled();
            }
            return;
        }

        if context.is_waiting() && !context.control_has_default_value() {
            context.started();
            context.set_timeout(self.duration);
        } else if context.is_started() && context.control_has_default_value() {
            if context.elapsed() <= self.duration {
                context.performed();
            } else {
                context.cancelled();
            }
        }
    }

    fn name(&self) -> &'static str {
        "tap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::modifier::ModifierRequest;
    use crate::input::phase::Phase;

    fn run(phase: Phase, time: f64, at_default: bool, expired: bool) -> Vec<ModifierRequest> {
        let mut tap = TapModifier::new(0.2);
        let mut context = ModifierContext::new(phase, time, 0.0, None, at_default, expired);
        tap.process(&mut context);
        context.into_requests()
    }

    #[test]
    fn test_press_starts_with_timeout() {
        assert_eq!(
            run(Phase::Waiting, 0.0, false, false),
            vec![ModifierRequest::Started, ModifierRequest::SetTimeout(0.2)]
        );
    }

    #[test]
    fn test_quick_release_performs() {
        assert_eq!(
            run(Phase::Started, 0.1, true, false),
            vec![ModifierRequest::Performed]
        );
    }

    #[test]
    fn test_slow_release_cancels() {
        assert_eq!(
            run(Phase::Started, 0.5, true, false),
            vec![ModifierRequest::Cancelled]
        );
    }

    #[test]
    fn test_timeout_cancels() {
        assert_eq!(
            run(Phase::Started, 0.2, false, true),
            vec![ModifierRequest::Cancelled]
        );
    }

    #[test]
    fn test_timeout_when_waiting_is_ignored() {
        assert!(run(Phase::Waiting, 0.2, false, true).is_empty());
    }
}
