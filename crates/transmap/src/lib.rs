//! Transition alphabet dictionary for shift-reduce parsers.
//!
//! Parser models refer to actions by dense integer ids. This crate owns the
//! mapping between those ids and [`Transition`] values, and persists it so a
//! trained model keeps the same action space across runs.
//!
//! # Architecture
//!
//! - [`map`] -- In-memory dictionary (id to transition and back)
//! - [`format`] -- Binary encoding of the dictionary
//! - [`store`] -- Plain and gzip file stores, and store lookup under a prefix
//!
//! # Features
//!
//! - `gzip` (default): save as `parser.trans.gz` and try it first on load.
//!   Without it only `parser.trans` is read or written.

use std::fmt;
use std::path::PathBuf;

pub mod format;
pub mod map;
pub mod store;

pub use map::TransitionMap;
pub use transmap_core::{Label, ParseTransitionError, Transition, TransitionKind};

/// Error type for transition map lookups and persistence.
#[derive(Debug, thiserror::Error)]
pub enum TransMapError {
    /// No store file exists or it could not be opened.
    #[error("missing transitions store: {}", path.display())]
    MissingStore { path: PathBuf },
    /// The store's content does not match its declared structure.
    #[error("malformed transitions store: {0}")]
    MalformedStore(String),
    /// A lookup asked for an id or transition that is not in the map.
    #[error("transition lookup out of range: {0}")]
    OutOfRange(String),
    /// Reading or writing the underlying stream failed.
    #[error("transitions store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Dense, zero-based identifier of an interned transition.
///
/// Ids are assigned in first-seen order and never reused, so they can index
/// model weight arrays directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TransId(usize);

impl TransId {
    /// Raw index into the dictionary's transition list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// Build an id from a raw index, e.g. a model weight row.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for TransId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_kind() {
        let missing = TransMapError::MissingStore {
            path: PathBuf::from("model/parser.trans"),
        };
        assert_eq!(
            missing.to_string(),
            "missing transitions store: model/parser.trans"
        );

        let malformed = TransMapError::MalformedStore("too few transitions".into());
        assert_eq!(
            malformed.to_string(),
            "malformed transitions store: too few transitions"
        );

        let range = TransMapError::OutOfRange("id 3 (size 0)".into());
        assert_eq!(range.to_string(), "transition lookup out of range: id 3 (size 0)");
    }

    #[test]
    fn trans_id_ordering_follows_index() {
        assert!(TransId::from_index(0) < TransId::from_index(1));
        assert_eq!(TransId::from_index(7).index(), 7);
        assert_eq!(TransId::from_index(42).to_string(), "42");
    }
}
