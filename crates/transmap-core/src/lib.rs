//! Shared value types for transition-based parsing.
//!
//! - [`transition`] -- The closed set of parser actions and their labels

pub mod transition;

pub use transition::{Label, ParseTransitionError, Transition, TransitionKind};
