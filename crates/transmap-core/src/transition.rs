// Parser actions: the closed kind set, grammar labels, and the text form
// used in diagnostics (`SHIFT`, `REDUCE-L NP`, ...).

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// TransitionKind
// ---------------------------------------------------------------------------

/// The kind of a parser action, without its payload.
///
/// The discriminant values are the on-disk tags of the transition store and
/// must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TransitionKind {
    /// Move the next buffer token onto the stack.
    Shift = 0,
    /// Combine the top two stack items; the left one is the head.
    ReduceLeft = 1,
    /// Combine the top two stack items; the right one is the head.
    ReduceRight = 2,
    /// Wrap the top stack item in a new constituent.
    Unary = 3,
    /// Mark the parse as complete.
    Finalize = 4,
    /// No-op emitted after finalization.
    Idle = 5,
}

impl TransitionKind {
    /// Every kind, in tag order.
    pub const ALL: [TransitionKind; 6] = [
        TransitionKind::Shift,
        TransitionKind::ReduceLeft,
        TransitionKind::ReduceRight,
        TransitionKind::Unary,
        TransitionKind::Finalize,
        TransitionKind::Idle,
    ];

    /// The persisted tag for this kind.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a persisted tag back to its kind. Returns `None` for tags outside
    /// the closed set.
    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Whether transitions of this kind carry a grammar label.
    #[inline]
    pub fn has_label(self) -> bool {
        matches!(
            self,
            TransitionKind::ReduceLeft | TransitionKind::ReduceRight | TransitionKind::Unary
        )
    }

    /// Upper-case name used in the text form.
    pub fn name(self) -> &'static str {
        match self {
            TransitionKind::Shift => "SHIFT",
            TransitionKind::ReduceLeft => "REDUCE-L",
            TransitionKind::ReduceRight => "REDUCE-R",
            TransitionKind::Unary => "UNARY",
            TransitionKind::Finalize => "FINALIZE",
            TransitionKind::Idle => "IDLE",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// Grammar category attached to structure-building transitions (e.g. `NP`).
///
/// Labels are opaque: two labels are equal only if their bytes are equal.
/// Grammars normally use non-empty names, but the empty label is a valid
/// value everywhere (construction, text form, persisted stores) so that any
/// map that can be built can also be saved and loaded back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl From<String> for Label {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// A single parser action.
///
/// Only the reduce and unary variants hold a [`Label`], so equality and
/// hashing compare labels exactly where a label exists and nothing else
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transition {
    Shift,
    ReduceLeft(Label),
    ReduceRight(Label),
    Unary(Label),
    Finalize,
    Idle,
}

impl Transition {
    pub fn reduce_left(label: impl Into<Label>) -> Self {
        Transition::ReduceLeft(label.into())
    }

    pub fn reduce_right(label: impl Into<Label>) -> Self {
        Transition::ReduceRight(label.into())
    }

    pub fn unary(label: impl Into<Label>) -> Self {
        Transition::Unary(label.into())
    }

    /// Build a transition from a kind and an optional label.
    ///
    /// Fails if a label-carrying kind has no label, or an unlabeled kind is
    /// given one.
    pub fn from_parts(
        kind: TransitionKind,
        label: Option<Label>,
    ) -> Result<Self, ParseTransitionError> {
        match (kind, label) {
            (TransitionKind::Shift, None) => Ok(Transition::Shift),
            (TransitionKind::Finalize, None) => Ok(Transition::Finalize),
            (TransitionKind::Idle, None) => Ok(Transition::Idle),
            (TransitionKind::ReduceLeft, Some(label)) => Ok(Transition::ReduceLeft(label)),
            (TransitionKind::ReduceRight, Some(label)) => Ok(Transition::ReduceRight(label)),
            (TransitionKind::Unary, Some(label)) => Ok(Transition::Unary(label)),
            (kind, None) => Err(ParseTransitionError::MissingLabel(kind)),
            (kind, Some(_)) => Err(ParseTransitionError::UnexpectedLabel(kind)),
        }
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Shift => TransitionKind::Shift,
            Transition::ReduceLeft(_) => TransitionKind::ReduceLeft,
            Transition::ReduceRight(_) => TransitionKind::ReduceRight,
            Transition::Unary(_) => TransitionKind::Unary,
            Transition::Finalize => TransitionKind::Finalize,
            Transition::Idle => TransitionKind::Idle,
        }
    }

    /// The label, for reduce and unary transitions.
    pub fn label(&self) -> Option<&Label> {
        match self {
            Transition::ReduceLeft(label)
            | Transition::ReduceRight(label)
            | Transition::Unary(label) => Some(label),
            Transition::Shift | Transition::Finalize | Transition::Idle => None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{} {}", self.kind(), label),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Error returned when a transition cannot be built from text or parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTransitionError {
    #[error("unknown transition kind: {0:?}")]
    UnknownKind(String),
    #[error("{0} transition requires a label")]
    MissingLabel(TransitionKind),
    #[error("{0} transition does not take a label")]
    UnexpectedLabel(TransitionKind),
}

impl FromStr for Transition {
    type Err = ParseTransitionError;

    /// Parse the text form: a kind name, then for labeled kinds a single
    /// space and the label (which may itself contain spaces, or be empty).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, label) = match s.split_once(' ') {
            Some((name, label)) => (name, Some(label)),
            None => (s, None),
        };
        let kind = TransitionKind::from_name(name)
            .ok_or_else(|| ParseTransitionError::UnknownKind(name.to_string()))?;
        Transition::from_parts(kind, label.map(Label::from))
    }
}
