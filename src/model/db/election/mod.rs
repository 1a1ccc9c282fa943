mod base;
mod lifecycle;
mod patch;
mod validation;

pub use base::{
    Candidate, CandidateCore, Election, ElectionCore, Grade, GradeCore, ItemKind, NewElection,
};
pub use patch::ElectionPatch;
