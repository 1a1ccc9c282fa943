use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::majority_judgment::MeritProfile;
use crate::model::common::election::CandidateId;

use super::election::ElectionDescription;

/// The outcome of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    #[serde(flatten)]
    pub election: ElectionDescription,
    /// Candidate ID to rank, starting at 1 for the winner.
    pub ranking: BTreeMap<CandidateId, usize>,
    /// Candidate ID to merit profile, with an entry for every grade value.
    pub merit_profile: BTreeMap<CandidateId, MeritProfile>,
}
