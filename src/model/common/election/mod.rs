mod ident;
mod reference;

pub use ident::ElectionIdent;
pub use reference::{generate_ref, is_valid_ref};

/// Our election IDs are integers, allocated from a named counter.
pub type ElectionId = u32;
/// Elections are also addressed by a short random string.
pub type ElectionRef = String;
/// Candidate IDs are integers, unique across all elections.
pub type CandidateId = u32;
/// Grade IDs are integers, unique across all elections.
pub type GradeId = u32;
/// The integer a grade is ranked by; higher is better.
pub type GradeValue = u32;
/// Vote IDs are integers, unique across all elections.
pub type VoteId = u32;
