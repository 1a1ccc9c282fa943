use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::election::{
    CandidateId, ElectionId, ElectionRef, GradeId, GradeValue,
};

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Election name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    /// Votes are refused before this time, if set.
    pub date_start: Option<DateTime<Utc>>,
    /// Votes are refused after this time, if set.
    pub date_end: Option<DateTime<Utc>>,
    /// Hide the results until the election has ended.
    pub hide_results: bool,
    /// Only invited voters may take part.
    pub restricted: bool,
    /// Close the election now, regardless of its dates.
    pub force_close: bool,
    /// Results require a token scoped to this election.
    pub auth_for_result: bool,
    /// Number of invitations issued, for restricted elections.
    pub num_voters: u32,
}

/// Core candidate data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Image URL.
    #[serde(default)]
    pub image: String,
}

/// A candidate with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Core grade data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Higher is better.
    pub value: GradeValue,
}

/// A grade with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    #[serde(flatten)]
    pub grade: GradeCore,
}

impl Deref for Grade {
    type Target = GradeCore;

    fn deref(&self) -> &Self::Target {
        &self.grade
    }
}

impl DerefMut for Grade {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.grade
    }
}

/// An election that has not been stored yet: its ref is chosen, but no IDs are allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewElection {
    #[serde(rename = "ref")]
    pub election_ref: ElectionRef,
    #[serde(flatten)]
    pub election: ElectionCore,
    pub candidates: Vec<CandidateCore>,
    pub grades: Vec<GradeCore>,
}

impl NewElection {
    /// Attach the allocated IDs. `next_id` is called once per candidate, then once per grade.
    pub fn into_election(self, id: ElectionId, mut next_id: impl FnMut() -> u32) -> Election {
        let candidates = self
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                id: next_id(),
                candidate,
            })
            .collect();
        let grades = self
            .grades
            .into_iter()
            .map(|grade| Grade {
                id: next_id(),
                grade,
            })
            .collect();
        Election {
            id,
            election_ref: self.election_ref,
            election: self.election,
            candidates,
            grades,
        }
    }

    /// How many IDs [`Self::into_election`] will need.
    pub fn num_item_ids(&self) -> usize {
        self.candidates.len() + self.grades.len()
    }
}

/// An election from the database, with its unique IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    #[serde(rename = "ref")]
    pub election_ref: ElectionRef,
    #[serde(flatten)]
    pub election: ElectionCore,
    pub candidates: Vec<Candidate>,
    pub grades: Vec<Grade>,
}

impl Election {
    /// Get the candidate with the given ID, if it belongs to this election.
    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Get the grade with the given ID, if it belongs to this election.
    pub fn grade(&self, id: GradeId) -> Option<&Grade> {
        self.grades.iter().find(|g| g.id == id)
    }

    /// Count how many of the given IDs belong to this election.
    pub fn count_members(&self, ids: &[u32], kind: ItemKind) -> usize {
        ids.iter()
            .filter(|&&id| match kind {
                ItemKind::Candidate => self.candidate(id).is_some(),
                ItemKind::Grade => self.grade(id).is_some(),
            })
            .count()
    }
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// The kinds of item owned by an election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Candidate,
    Grade,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_allocated_in_order() {
        let election = Election::example(Utc::now());
        let candidate_ids: Vec<_> = election.candidates.iter().map(|c| c.id).collect();
        let grade_ids: Vec<_> = election.grades.iter().map(|g| g.id).collect();
        assert_eq!(candidate_ids, vec![1, 2]);
        assert_eq!(grade_ids, vec![3, 4]);
    }

    #[test]
    fn membership_is_per_kind() {
        let election = Election::example(Utc::now());
        assert_eq!(election.count_members(&[1, 2, 3], ItemKind::Candidate), 2);
        assert_eq!(election.count_members(&[1, 2, 3], ItemKind::Grade), 1);
        assert_eq!(election.count_members(&[99], ItemKind::Grade), 0);
    }

    #[test]
    fn serialises_ref_and_id_under_db_names() {
        let election = Election::example(Utc::now());
        let value = rocket::serde::json::serde_json::to_value(&election).unwrap();
        assert_eq!(value["_id"], 1);
        assert_eq!(value["ref"], "qwertyuiop");
        assert_eq!(value["candidates"][0]["name"], "A");
        assert_eq!(value["grades"][1]["value"], 0);
    }
}
