use std::collections::HashSet;
use std::hash::Hash;

use crate::config::Config;
use crate::error::{Error, Result};

use super::{CandidateCore, Election, ElectionCore, GradeCore, NewElection};

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 1024;
const MAX_IMAGE_LEN: usize = 255;

fn check_len(what: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(Error::invalid(format!(
            "{what} must be between {min} and {max} characters long, got {len}"
        )));
    }
    Ok(())
}

fn check_count(what: &str, count: usize, max: usize) -> Result<()> {
    if count < 2 || count > max {
        return Err(Error::invalid(format!(
            "An election needs between 2 and {max} {what}, got {count}"
        )));
    }
    Ok(())
}

fn check_unique<T: Eq + Hash>(what: &str, values: impl IntoIterator<Item = T>) -> Result<()> {
    let mut seen = HashSet::new();
    if values.into_iter().all(|value| seen.insert(value)) {
        Ok(())
    } else {
        Err(Error::invalid(format!("{what} must be unique")))
    }
}

/// Check the content rules shared by new and updated elections.
fn validate_content(
    election: &ElectionCore,
    candidates: &[&CandidateCore],
    grades: &[&GradeCore],
    config: &Config,
) -> Result<()> {
    check_len("Election name", &election.name, 1, MAX_NAME_LEN)?;
    check_len("Election description", &election.description, 0, MAX_DESCRIPTION_LEN)?;

    check_count("candidates", candidates.len(), config.max_candidates())?;
    for candidate in candidates {
        check_len("Candidate name", &candidate.name, 1, MAX_NAME_LEN)?;
        check_len("Candidate description", &candidate.description, 0, MAX_DESCRIPTION_LEN)?;
        check_len("Candidate image", &candidate.image, 0, MAX_IMAGE_LEN)?;
    }
    check_unique("Candidate names", candidates.iter().map(|c| c.name.as_str()))?;

    check_count("grades", grades.len(), config.max_grades())?;
    for grade in grades {
        check_len("Grade name", &grade.name, 1, MAX_NAME_LEN)?;
        check_len("Grade description", &grade.description, 0, MAX_DESCRIPTION_LEN)?;
        if grade.value as usize >= config.max_grades() {
            return Err(Error::invalid(format!(
                "Grade values must be below {}, got {}",
                config.max_grades(),
                grade.value
            )));
        }
    }
    check_unique("Grade names", grades.iter().map(|g| g.name.as_str()))?;
    check_unique("Grade values", grades.iter().map(|g| g.value))?;

    if let (Some(start), Some(end)) = (election.date_start, election.date_end) {
        if start >= end {
            return Err(Error::invalid("The start date must be before the end date"));
        }
    }

    if election.num_voters > config.max_voters() {
        return Err(Error::invalid(format!(
            "At most {} voters can be invited",
            config.max_voters()
        )));
    }
    if election.num_voters > 0 && !election.restricted {
        return Err(Error::invalid(
            "Voters can only be invited to restricted elections",
        ));
    }
    if election.hide_results && election.num_voters == 0 && election.date_end.is_none() {
        return Err(Error::invalid(
            "An election with hidden results needs an end date or invited voters",
        ));
    }

    Ok(())
}

impl NewElection {
    pub fn validate(&self, config: &Config) -> Result<()> {
        let candidates: Vec<_> = self.candidates.iter().collect();
        let grades: Vec<_> = self.grades.iter().collect();
        validate_content(&self.election, &candidates, &grades, config)
    }
}

impl Election {
    pub fn validate(&self, config: &Config) -> Result<()> {
        let candidates: Vec<_> = self.candidates.iter().map(|c| &c.candidate).collect();
        let grades: Vec<_> = self.grades.iter().map(|g| &g.grade).collect();
        validate_content(&self.election, &candidates, &grades, config)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn new_election() -> NewElection {
        let election = Election::example(Utc::now());
        NewElection {
            election_ref: election.election_ref,
            election: election.election,
            candidates: election.candidates.into_iter().map(|c| c.candidate).collect(),
            grades: election.grades.into_iter().map(|g| g.grade).collect(),
        }
    }

    fn assert_invalid(election: &NewElection) {
        assert!(
            matches!(election.validate(&Config::example()), Err(Error::Invalid(_))),
            "{election:?} should be invalid"
        );
    }

    #[test]
    fn example_is_valid() {
        new_election().validate(&Config::example()).unwrap();
        Election::example(Utc::now())
            .validate(&Config::example())
            .unwrap();
    }

    #[test]
    fn names_are_bounded() {
        let mut election = new_election();
        election.election.name = String::new();
        assert_invalid(&election);

        let mut election = new_election();
        election.election.name = "x".repeat(256);
        assert_invalid(&election);

        let mut election = new_election();
        election.election.name = "é".repeat(255);
        election.validate(&Config::example()).unwrap();

        let mut election = new_election();
        election.candidates[0].image = "x".repeat(256);
        assert_invalid(&election);
    }

    #[test]
    fn item_counts_are_bounded() {
        let mut election = new_election();
        election.candidates.truncate(1);
        assert_invalid(&election);

        let mut election = new_election();
        election.grades = (0..11)
            .map(|v| GradeCore::example(&format!("g{v}"), v))
            .collect();
        assert_invalid(&election);
    }

    #[test]
    fn items_are_unique() {
        let mut election = new_election();
        election.candidates[1].name = election.candidates[0].name.clone();
        assert_invalid(&election);

        let mut election = new_election();
        election.grades[1].value = election.grades[0].value;
        assert_invalid(&election);

        let mut election = new_election();
        election.grades[1].name = election.grades[0].name.clone();
        assert_invalid(&election);
    }

    #[test]
    fn grade_values_are_bounded() {
        let mut election = new_election();
        election.grades[0].value = 10;
        assert_invalid(&election);
    }

    #[test]
    fn start_before_end() {
        let mut election = new_election();
        election.election.date_end = election.election.date_start;
        assert_invalid(&election);

        election.election.date_end = election.election.date_start.map(|d| d - Duration::days(1));
        assert_invalid(&election);
    }

    #[test]
    fn invites_need_a_restricted_election() {
        let mut election = new_election();
        election.election.num_voters = 3;
        assert_invalid(&election);

        election.election.restricted = true;
        election.validate(&Config::example()).unwrap();

        election.election.num_voters = 1_000_001;
        assert_invalid(&election);
    }

    #[test]
    fn hidden_results_must_be_revealable() {
        let mut election = new_election();
        election.election.hide_results = true;
        election.election.date_end = None;
        assert_invalid(&election);

        election.election.restricted = true;
        election.election.num_voters = 1;
        election.validate(&Config::example()).unwrap();
    }
}
