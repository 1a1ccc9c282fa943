use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Candidate, Election, ElectionCore, Grade};

/// The mutable fields of an election. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub hide_results: Option<bool>,
    pub force_close: Option<bool>,
    pub auth_for_result: Option<bool>,
}

impl ElectionPatch {
    /// Does this patch move the start date?
    pub fn changes_start(&self, current: &ElectionCore) -> bool {
        self.date_start.is_some() && self.date_start != current.date_start
    }

    pub fn apply(self, election: &mut ElectionCore) {
        if let Some(name) = self.name {
            election.name = name;
        }
        if let Some(description) = self.description {
            election.description = description;
        }
        if let Some(date_start) = self.date_start {
            election.date_start = Some(date_start);
        }
        if let Some(date_end) = self.date_end {
            election.date_end = Some(date_end);
        }
        if let Some(hide_results) = self.hide_results {
            election.hide_results = hide_results;
        }
        if let Some(force_close) = self.force_close {
            election.force_close = force_close;
        }
        if let Some(auth_for_result) = self.auth_for_result {
            election.auth_for_result = auth_for_result;
        }
    }
}

/// Fail unless both slices carry exactly the same set of IDs.
fn check_same_ids(kind: &str, current: &[u32], submitted: &[u32]) -> Result<()> {
    let current_ids: BTreeSet<_> = current.iter().collect();
    let submitted_ids: BTreeSet<_> = submitted.iter().collect();
    if submitted_ids.len() != submitted.len() || current_ids != submitted_ids {
        return Err(Error::ImmutableIds(format!(
            "The {kind} IDs of an election cannot change"
        )));
    }
    Ok(())
}

impl Election {
    /// Replace the content of the existing candidates. The set of IDs must stay the same.
    pub fn replace_candidates(&mut self, candidates: Vec<Candidate>) -> Result<()> {
        let current: Vec<_> = self.candidates.iter().map(|c| c.id).collect();
        let submitted: Vec<_> = candidates.iter().map(|c| c.id).collect();
        check_same_ids("candidate", &current, &submitted)?;
        for candidate in candidates {
            if let Some(existing) = self.candidates.iter_mut().find(|c| c.id == candidate.id) {
                existing.candidate = candidate.candidate;
            }
        }
        Ok(())
    }

    /// Replace the content of the existing grades. The set of IDs must stay the same.
    pub fn replace_grades(&mut self, grades: Vec<Grade>) -> Result<()> {
        let current: Vec<_> = self.grades.iter().map(|g| g.id).collect();
        let submitted: Vec<_> = grades.iter().map(|g| g.id).collect();
        check_same_ids("grade", &current, &submitted)?;
        for grade in grades {
            if let Some(existing) = self.grades.iter_mut().find(|g| g.id == grade.id) {
                existing.grade = grade.grade;
            }
        }
        Ok(())
    }
}
