use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{CandidateId, ElectionRef, GradeId, VoteId},
    db::{
        election::{Candidate, Election, Grade},
        vote::Vote,
    },
};

use super::election::ElectionDescription;

/// One submitted grade for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteSpec {
    pub candidate_id: CandidateId,
    pub grade_id: GradeId,
}

/// A ballot cast directly on an unrestricted election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSpec {
    pub election_ref: ElectionRef,
    pub votes: Vec<VoteSpec>,
}

/// New grades for every vote of an existing ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotUpdate {
    pub votes: Vec<VoteSpec>,
}

/// A vote with its candidate and grade resolved. Both are unset on unfilled invitations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDescription {
    pub id: VoteId,
    pub candidate: Option<Candidate>,
    pub grade: Option<Grade>,
}

impl VoteDescription {
    pub fn new(vote: &Vote, election: &Election) -> Self {
        Self {
            id: vote.id,
            candidate: vote
                .candidate_id
                .and_then(|id| election.candidate(id))
                .cloned(),
            grade: vote.grade_id.and_then(|id| election.grade(id)).cloned(),
        }
    }
}

/// A ballot, the election it belongs to, and the token that gives access to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotDescription {
    pub votes: Vec<VoteDescription>,
    pub election: ElectionDescription,
    pub token: String,
}

impl BallotDescription {
    pub fn new(votes: &[Vote], election: Election, token: String) -> Self {
        Self {
            votes: votes
                .iter()
                .map(|vote| VoteDescription::new(vote, &election))
                .collect(),
            election: election.into(),
            token,
        }
    }
}
