//! Data model for reviewing machine-proposed schema matches.
//!
//! The types here are produced by external collaborators (matching service,
//! ontology service) and consumed by the layout engine in `matchview-layout`.

pub mod candidate;
pub mod error;
pub mod focus;
pub mod ontology;
pub mod snapshot;

pub use candidate::{AggregatedCandidate, CandidateStatus, MatcherWeight, ScoredCandidate};
pub use error::{ModelError, Result};
pub use focus::{FocusState, FocusedCell};
pub use ontology::{OntologyEntry, Side};
pub use snapshot::MatchSnapshot;
