// Declarative bindings and the arrays that own them

use std::fmt;
use std::ops::Range;

use super::resolver::ResolvedBinding;

/// Declarative reference from an action to one or more input sources
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Binding {
    /// Path expression resolved against the control namespace
    pub path: String,

    /// Replaces `path` during resolution when set
    pub override_path: Option<String>,

    /// Modifier chain, e.g. `"tap,slowtap(duration=0.8)"`
    pub modifiers: Option<String>,

    /// Label used to pick this binding out of several (e.g. "Keyboard")
    pub group: Option<String>,

    /// Read together with the previous binding as one composite input
    pub combine_with_previous: bool,
}

impl Binding {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl Into<String>) -> Self {
        self.modifiers = Some(modifiers.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Mark this binding as the next part of a composite
    pub fn combined(mut self) -> Self {
        self.combine_with_previous = true;
        self
    }

    /// Path that resolution uses
    pub fn effective_path(&self) -> &str {
        self.override_path.as_deref().unwrap_or(&self.path)
    }

    pub fn has_override(&self) -> bool {
        self.override_path.is_some()
    }
}

/// Replacement path for one binding of an action, picked by group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOverride {
    pub path: String,
    pub group: Option<String>,
}

impl BindingOverride {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            group: None,
        }
    }

    pub fn for_group(path: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            group: Some(group.into()),
        }
    }
}

/// An action's contiguous slice of a set's binding array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingWindow {
    pub start: usize,
    pub count: usize,
}

impl BindingWindow {
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.count
    }

    pub fn end(&self) -> usize {
        self.start + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Growable arena of bindings plus its cached resolution
///
/// Owned either by an [`ActionSet`](super::ActionSet) or privately by a
/// standalone [`Action`](super::Action).
#[derive(Default)]
pub struct BindingArray {
    pub(crate) bindings: Vec<Binding>,

    /// One entry per binding, present once resolved
    pub(crate) resolved: Option<Vec<ResolvedBinding>>,
}

impl BindingArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Drop the cached resolution so the next enable rebuilds it
    pub fn invalidate(&mut self) {
        self.resolved = None;
    }

    /// Insert a binding at `index`, invalidating resolution
    pub(crate) fn insert(&mut self, index: usize, binding: Binding) {
        self.bindings.insert(index, binding);
        self.invalidate();
    }
}

impl fmt::Debug for BindingArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingArray")
            .field("bindings", &self.bindings)
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

/// Find the binding an override targets within one action's bindings
///
/// Without a group the action must have exactly one binding.
pub(crate) fn find_binding_for_group(
    bindings: &[Binding],
    group: Option<&str>,
) -> Result<usize, GroupLookupError> {
    match group {
        Some(group) => bindings
            .iter()
            .position(|b| b.group.as_deref() == Some(group))
            .ok_or(GroupLookupError::NoMatch),
        None => match bindings.len() {
            0 => Err(GroupLookupError::NoMatch),
            1 => Ok(0),
            _ => Err(GroupLookupError::Ambiguous),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupLookupError {
    NoMatch,
    Ambiguous,
}

/// Current overrides of a window of bindings, in binding order
pub(crate) fn collect_overrides(bindings: &[Binding]) -> Vec<BindingOverride> {
    bindings
        .iter()
        .filter_map(|b| {
            b.override_path.as_ref().map(|path| BindingOverride {
                path: path.clone(),
                group: b.group.clone(),
            })
        })
        .collect()
}
