// TransitionMap: interning dictionary between transitions and dense ids.

use std::io::{Read, Write};
use std::path::Path;

use hashbrown::HashMap;
use transmap_core::Transition;

use crate::{TransId, TransMapError, format, store};

/// Bidirectional dictionary between [`Transition`]s and [`TransId`]s.
///
/// Entries are only ever appended, so an id handed out once stays valid for
/// the lifetime of the map. `intern` is the only mutating operation; once a
/// map is built it can be shared read-only between threads (e.g. behind an
/// `Arc`).
#[derive(Debug, Clone, Default)]
pub struct TransitionMap {
    /// Transitions indexed by id.
    transitions: Vec<Transition>,
    /// Reverse index. Always the same size as `transitions`.
    ids: HashMap<Transition, TransId>,
}

impl TransitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            transitions: Vec::with_capacity(capacity),
            ids: HashMap::with_capacity(capacity),
        }
    }

    /// Load a map from the store under `prefix`.
    ///
    /// Tries `parser.trans.gz` first when gzip support is compiled in, then
    /// `parser.trans`.
    pub fn load(prefix: impl AsRef<Path>) -> Result<Self, TransMapError> {
        store::load_prefix(prefix.as_ref())
    }

    /// Save the map under `prefix` in the build's default store format.
    ///
    /// A failed save may leave a partially written file behind.
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<(), TransMapError> {
        store::save_prefix(prefix.as_ref(), self)
    }

    /// Decode a map from an uncompressed byte stream.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, TransMapError> {
        format::read_transitions(reader)
    }

    /// Encode the map to an uncompressed byte stream, in id order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), TransMapError> {
        format::write_transitions(writer, &self.transitions)?;
        Ok(())
    }

    /// Get the id of `transition`, assigning the next id if it is new.
    pub fn intern(&mut self, transition: &Transition) -> TransId {
        if let Some(&id) = self.ids.get(transition) {
            return id;
        }
        self.push(transition.clone())
    }

    /// Like [`intern`](Self::intern), but takes ownership and avoids a clone
    /// when the transition is new.
    pub fn intern_owned(&mut self, transition: Transition) -> TransId {
        if let Some(&id) = self.ids.get(&transition) {
            return id;
        }
        self.push(transition)
    }

    fn push(&mut self, transition: Transition) -> TransId {
        let id = TransId(self.transitions.len());
        self.ids.insert(transition.clone(), id);
        self.transitions.push(transition);
        id
    }

    /// The transition with the given id.
    pub fn transition(&self, id: TransId) -> Result<&Transition, TransMapError> {
        self.get(id).ok_or_else(|| {
            TransMapError::OutOfRange(format!("id {id} (size {})", self.transitions.len()))
        })
    }

    /// The id of an already interned transition. Never inserts.
    pub fn id(&self, transition: &Transition) -> Result<TransId, TransMapError> {
        self.get_id(transition)
            .ok_or_else(|| TransMapError::OutOfRange(format!("{transition} is not interned")))
    }

    #[inline]
    pub fn get(&self, id: TransId) -> Option<&Transition> {
        self.transitions.get(id.0)
    }

    #[inline]
    pub fn get_id(&self, transition: &Transition) -> Option<TransId> {
        self.ids.get(transition).copied()
    }

    pub fn contains(&self, transition: &Transition) -> bool {
        self.ids.contains_key(transition)
    }

    /// Number of interned transitions.
    pub fn size(&self) -> u64 {
        self.len() as u64
    }

    #[inline]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.ids.len(), self.transitions.len());
        self.transitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// All transitions, indexed by id.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Iterate over `(id, transition)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TransId, &Transition)> {
        self.transitions
            .iter()
            .enumerate()
            .map(|(i, t)| (TransId(i), t))
    }
}

impl PartialEq for TransitionMap {
    fn eq(&self, other: &Self) -> bool {
        // The reverse index is derived from the list.
        self.transitions == other.transitions
    }
}

impl Eq for TransitionMap {}

impl Extend<Transition> for TransitionMap {
    fn extend<I: IntoIterator<Item = Transition>>(&mut self, iter: I) {
        for transition in iter {
            self.intern_owned(transition);
        }
    }
}

impl FromIterator<Transition> for TransitionMap {
    fn from_iter<I: IntoIterator<Item = Transition>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}
