use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{ElectionId, ElectionRef},
    db::election::{
        Candidate, CandidateCore, Election, ElectionCore, ElectionPatch, Grade, GradeCore,
        NewElection,
    },
};

/// An election specification, as submitted by its organiser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Candidates, in display order.
    pub candidates: Vec<CandidateCore>,
    /// Grades; their values give the order.
    pub grades: Vec<GradeCore>,
    #[serde(default)]
    pub date_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hide_results: bool,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub auth_for_result: bool,
    /// How many invitations to issue. Only for restricted elections.
    #[serde(default)]
    pub num_voters: u32,
}

impl ElectionSpec {
    /// Convert this spec into an election ready to be stored under the given ref.
    pub fn into_new_election(self, election_ref: ElectionRef, now: DateTime<Utc>) -> NewElection {
        NewElection {
            election_ref,
            election: ElectionCore {
                name: self.name,
                description: self.description,
                date_created: now,
                date_modified: now,
                date_start: self.date_start,
                date_end: self.date_end,
                hide_results: self.hide_results,
                restricted: self.restricted,
                force_close: false,
                auth_for_result: self.auth_for_result,
                num_voters: self.num_voters,
            },
            candidates: self.candidates,
            grades: self.grades,
        }
    }
}

/// Changes to an existing election. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionUpdate {
    #[serde(flatten)]
    pub patch: ElectionPatch,
    /// Cannot change, but may be repeated.
    pub restricted: Option<bool>,
    /// Can only grow, issuing the difference as new invitations.
    pub num_voters: Option<u32>,
    /// New content for the existing candidates.
    pub candidates: Option<Vec<Candidate>>,
    /// New content for the existing grades.
    pub grades: Option<Vec<Grade>>,
}

/// An API-friendly election description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: ElectionId,
    #[serde(rename = "ref")]
    pub election_ref: ElectionRef,
    #[serde(flatten)]
    pub election: ElectionCore,
    pub candidates: Vec<Candidate>,
    pub grades: Vec<Grade>,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            election_ref: election.election_ref,
            election: election.election,
            candidates: election.candidates,
            grades: election.grades,
        }
    }
}

/// An election along with freshly issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionAndInvites {
    #[serde(flatten)]
    pub election: ElectionDescription,
    /// One ballot token per newly invited voter.
    pub invites: Vec<String>,
    /// Admin token, only returned when the election is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
}

/// How many invited voters have voted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub num_voters: u64,
    pub num_voters_voted: u64,
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json::{self, json};

    use super::*;

    #[test]
    fn spec_defaults() {
        let spec: ElectionSpec = serde_json::from_value(json!({
            "name": "Lunch",
            "candidates": [{"name": "Soup"}, {"name": "Salad", "image": "salad.png"}],
            "grades": [{"name": "Yum", "value": 1}, {"name": "Meh", "value": 0}],
        }))
        .unwrap();
        assert!(!spec.restricted);
        assert!(!spec.hide_results);
        assert_eq!(spec.num_voters, 0);
        assert_eq!(spec.date_end, None);
        assert_eq!(spec.candidates[0].image, "");
        assert_eq!(spec.candidates[1].image, "salad.png");
    }

    #[test]
    fn update_reads_patch_fields() {
        let update: ElectionUpdate = serde_json::from_value(json!({
            "name": "Dinner",
            "force_close": true,
            "num_voters": 4,
        }))
        .unwrap();
        assert_eq!(update.patch.name.as_deref(), Some("Dinner"));
        assert_eq!(update.patch.force_close, Some(true));
        assert_eq!(update.patch.description, None);
        assert_eq!(update.num_voters, Some(4));
        assert_eq!(update.candidates, None);
    }

    #[test]
    fn description_uses_api_names() {
        let now = Utc::now();
        let description = ElectionDescription::from(Election::example(now));
        let value = serde_json::to_value(&description).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["ref"], "qwertyuiop");
        assert_eq!(value["name"], "Best pizza topping");
        assert!(value.get("_id").is_none());
    }
}
