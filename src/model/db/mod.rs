//! DB-compatible (e.g. de/serialisable) types.
//!
//! These are also the snapshots handed to the ranking engine and the API layer.

pub mod election;
pub mod vote;

pub use election::{
    Candidate, CandidateCore, Election, ElectionCore, ElectionPatch, Grade, GradeCore, ItemKind,
    NewElection,
};
pub use vote::{Vote, VoteCore};
