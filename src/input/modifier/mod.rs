// Gesture modifiers attached to bindings
//
// A modifier never touches an action directly. During `process` it reads the
// event through a `ModifierContext` and records phase requests on it; the
// phase engine applies those requests, in call order, once `process` returns.

mod hold;
mod slow_tap;
mod tap;

use std::collections::HashMap;
use std::fmt;

use super::config::InputSettings;
use super::control::InputSource;
use super::phase::Phase;
use super::{InputError, Result};

pub use hold::HoldModifier;
pub use slow_tap::SlowTapModifier;
pub use tap::TapModifier;

/// A small stateful gesture recognizer
pub trait Modifier: fmt::Debug {
    /// Look at one event and request phase changes through the context
    fn process(&mut self, context: &mut ModifierContext);

    /// Drop any gesture state; called whenever the modifier returns to waiting
    fn reset(&mut self) {}

    /// Name used in descriptors and logs
    fn name(&self) -> &'static str;
}

/// Something a modifier asked the engine to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifierRequest {
    Started,
    Performed,
    Cancelled,
    /// Wake this modifier again after the given number of seconds
    SetTimeout(f64),
}

/// View of one event handed to [`Modifier::process`]
#[derive(Debug)]
pub struct ModifierContext {
    phase: Phase,
    time: f64,
    start_time: f64,
    control: Option<InputSource>,
    control_is_at_default: bool,
    timer_has_expired: bool,
    requests: Vec<ModifierRequest>,
}

impl ModifierContext {
    pub(crate) fn new(
        phase: Phase,
        time: f64,
        start_time: f64,
        control: Option<InputSource>,
        control_is_at_default: bool,
        timer_has_expired: bool,
    ) -> Self {
        Self {
            phase,
            time,
            start_time,
            control,
            control_is_at_default,
            timer_has_expired,
            requests: Vec::new(),
        }
    }

    /// Phase of this modifier (not of the action)
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_waiting(&self) -> bool {
        self.phase.is_waiting()
    }

    pub fn is_started(&self) -> bool {
        self.phase.is_started()
    }

    /// Time of the event being processed
    pub fn time(&self) -> f64 {
        self.time
    }

    /// When this modifier last went to `Started`
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Seconds since this modifier started
    pub fn elapsed(&self) -> f64 {
        self.time - self.start_time
    }

    pub fn control(&self) -> Option<InputSource> {
        self.control
    }

    /// Whether the control is back at its rest value
    pub fn control_has_default_value(&self) -> bool {
        self.control_is_at_default
    }

    /// Whether this call comes from an expired timeout
    pub fn timer_has_expired(&self) -> bool {
        self.timer_has_expired
    }

    pub fn started(&mut self) {
        self.requests.push(ModifierRequest::Started);
    }

    pub fn performed(&mut self) {
        self.requests.push(ModifierRequest::Performed);
    }

    pub fn cancelled(&mut self) {
        self.requests.push(ModifierRequest::Cancelled);
    }

    /// Ask to be processed again `seconds` from now
    pub fn set_timeout(&mut self, seconds: f64) {
        self.requests.push(ModifierRequest::SetTimeout(seconds));
    }

    pub(crate) fn into_requests(self) -> Vec<ModifierRequest> {
        self.requests
    }
}

/// `name=value` pairs from a descriptor entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierParams {
    modifier: String,
    values: Vec<(String, String)>,
}

impl ModifierParams {
    pub fn modifier(&self) -> &str {
        &self.modifier
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse a numeric parameter
    pub fn get_f64(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(Some)
                .ok_or_else(|| InputError::InvalidModifierParameter {
                    modifier: self.modifier.clone(),
                    message: format!("'{}' is not a valid value for {}", raw, name),
                }),
        }
    }

    /// Reject parameters a modifier does not understand
    pub fn expect_only(&self, known: &[&str]) -> Result<()> {
        match self
            .values
            .iter()
            .find(|(key, _)| !known.iter().any(|k| key.eq_ignore_ascii_case(k)))
        {
            Some((key, _)) => Err(InputError::InvalidModifierParameter {
                modifier: self.modifier.clone(),
                message: format!("unknown parameter '{}'", key),
            }),
            None => Ok(()),
        }
    }
}

/// Constructor for a modifier kind
pub type ModifierFactory = fn(&ModifierParams, &InputSettings) -> Result<Box<dyn Modifier>>;

/// Maps descriptor names to modifier constructors
pub struct ModifierRegistry {
    factories: HashMap<String, ModifierFactory>,
    settings: InputSettings,
}

impl ModifierRegistry {
    /// Registry with the built-in gestures
    pub fn new(settings: InputSettings) -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
            settings,
        };
        registry.register("hold", HoldModifier::from_params);
        registry.register("tap", TapModifier::from_params);
        registry.register("slowtap", SlowTapModifier::from_params);
        registry
    }

    /// Add or replace a modifier kind
    pub fn register(&mut self, name: &str, factory: ModifierFactory) {
        self.factories.insert(name.to_lowercase(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Instantiate the chain described by `descriptor`, in order
    pub fn instantiate(&self, descriptor: &str) -> Result<Vec<Box<dyn Modifier>>> {
        parse_descriptor(descriptor)?
            .iter()
            .map(|params| {
                let factory = self
                    .factories
                    .get(&params.modifier)
                    .ok_or_else(|| InputError::UnknownModifier(params.modifier.clone()))?;
                factory(params, &self.settings)
            })
            .collect()
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &names)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::new(InputSettings::default())
    }
}

/// Parse `"tap, hold(duration=0.8)"` into one entry per modifier
pub fn parse_descriptor(descriptor: &str) -> Result<Vec<ModifierParams>> {
    split_top_level(descriptor)?
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(entry: &str) -> Result<ModifierParams> {
    let (name, args) = match entry.split_once('(') {
        Some((name, rest)) => {
            let args = rest.strip_suffix(')').ok_or_else(|| {
                InputError::InvalidModifierParameter {
                    modifier: name.trim().to_lowercase(),
                    message: format!("missing ')' in '{}'", entry),
                }
            })?;
            (name.trim(), args)
        }
        None => (entry, ""),
    };

    let modifier = name.to_lowercase();
    let mut values = Vec::new();
    for pair in args.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) =
            pair.split_once('=')
                .ok_or_else(|| InputError::InvalidModifierParameter {
                    modifier: modifier.clone(),
                    message: format!("expected name=value, got '{}'", pair),
                })?;
        values.push((key.trim().to_string(), value.trim().to_string()));
    }

    Ok(ModifierParams { modifier, values })
}

/// Split on commas that are not inside parentheses
fn split_top_level(descriptor: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in descriptor.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    InputError::InvalidModifierParameter {
                        modifier: descriptor.to_string(),
                        message: "unbalanced ')'".to_string(),
                    }
                })?;
            }
            ',' if depth == 0 => {
                parts.push(&descriptor[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(InputError::InvalidModifierParameter {
            modifier: descriptor.to_string(),
            message: "unbalanced '('".to_string(),
        });
    }
    parts.push(&descriptor[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_descriptor() {
        assert!(parse_descriptor("").unwrap().is_empty());
        assert!(parse_descriptor("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_names_and_params() {
        let entries = parse_descriptor("Tap, hold(duration=0.8), slowtap()").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].modifier(), "tap");
        assert_eq!(entries[1].modifier(), "hold");
        assert_eq!(entries[1].get("duration"), Some("0.8"));
        assert_eq!(entries[1].get_f64("Duration").unwrap(), Some(0.8));
        assert_eq!(entries[2].get("duration"), None);
    }

    #[test]
    fn test_parse_multiple_params() {
        let entries = parse_descriptor("hold(duration=1, pressPoint=0.5)").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get("presspoint"), Some("0.5"));
    }

    #[test]
    fn test_parse_unbalanced() {
        assert!(matches!(
            parse_descriptor("hold(duration=1"),
            Err(InputError::InvalidModifierParameter { .. })
        ));
        assert!(parse_descriptor("hold)").is_err());
    }

    #[test]
    fn test_parse_bad_pair() {
        assert!(parse_descriptor("hold(duration)").is_err());
    }

    #[test]
    fn test_bad_number() {
        let entries = parse_descriptor("hold(duration=soon)").unwrap();
        assert!(entries[0].get_f64("duration").is_err());

        let entries = parse_descriptor("hold(duration=-1)").unwrap();
        assert!(entries[0].get_f64("duration").is_err());
    }

    #[test]
    fn test_registry_instantiates_in_order() {
        let registry = ModifierRegistry::default();
        let chain = registry.instantiate("tap,hold,slowtap").unwrap();
        let names: Vec<_> = chain.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["tap", "hold", "slowtap"]);
    }

    #[test]
    fn test_registry_unknown_modifier() {
        let registry = ModifierRegistry::default();
        assert!(matches!(
            registry.instantiate("doubletap"),
            Err(InputError::UnknownModifier(name)) if name == "doubletap"
        ));
    }

    #[test]
    fn test_registry_rejects_unknown_param() {
        let registry = ModifierRegistry::default();
        assert!(registry.instantiate("hold(speed=2)").is_err());
    }

    #[test]
    fn test_registry_custom_modifier() {
        #[derive(Debug)]
        struct Instant;

        impl Modifier for Instant {
            fn process(&mut self, context: &mut ModifierContext) {
                context.performed();
            }

            fn name(&self) -> &'static str {
                "instant"
            }
        }

        fn make(_: &ModifierParams, _: &InputSettings) -> Result<Box<dyn Modifier>> {
            Ok(Box::new(Instant))
        }

        let mut registry = ModifierRegistry::default();
        assert!(!registry.contains("instant"));
        registry.register("Instant", make);
        assert!(registry.contains("INSTANT"));
        assert_eq!(registry.instantiate("instant").unwrap().len(), 1);
    }

    #[test]
    fn test_context_records_requests_in_order() {
        let mut context = ModifierContext::new(Phase::Waiting, 1.0, 0.0, None, false, false);
        context.started();
        context.set_timeout(0.4);
        assert_eq!(
            context.into_requests(),
            vec![ModifierRequest::Started, ModifierRequest::SetTimeout(0.4)]
        );
    }

    #[test]
    fn test_context_elapsed() {
        let context = ModifierContext::new(Phase::Started, 1.5, 1.0, None, true, false);
        assert!(context.is_started());
        assert!((context.elapsed() - 0.5).abs() < 1e-9);
    }
}
