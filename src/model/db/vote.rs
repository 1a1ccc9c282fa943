use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateId, ElectionRef, GradeId, VoteId};

/// Core vote data: one voter's grade for one candidate.
///
/// Invitations are stored as placeholder votes with neither a candidate nor a grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    /// The election this vote belongs to.
    pub election_ref: ElectionRef,
    pub candidate_id: Option<CandidateId>,
    pub grade_id: Option<GradeId>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl VoteCore {
    /// A vote that has been cast.
    pub fn cast(
        election_ref: impl Into<ElectionRef>,
        candidate_id: CandidateId,
        grade_id: GradeId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            election_ref: election_ref.into(),
            candidate_id: Some(candidate_id),
            grade_id: Some(grade_id),
            date_created: now,
            date_modified: now,
        }
    }

    /// An empty vote reserved for an invited voter.
    pub fn placeholder(election_ref: impl Into<ElectionRef>, now: DateTime<Utc>) -> Self {
        Self {
            election_ref: election_ref.into(),
            candidate_id: None,
            grade_id: None,
            date_created: now,
            date_modified: now,
        }
    }

    /// Has a grade been given?
    pub fn is_cast(&self) -> bool {
        self.grade_id.is_some()
    }
}

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: VoteId,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

impl DerefMut for Vote {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vote
    }
}
