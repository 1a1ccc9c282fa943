//! Checks a ballot against its election before any vote is stored.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    api::ballot::VoteSpec,
    common::election::VoteId,
    db::{
        election::{Election, ItemKind},
        vote::Vote,
    },
};

/// Check that a ballot grades every candidate of the election exactly once.
pub fn validate_ballot(election: &Election, votes: &[VoteSpec]) -> Result<()> {
    if votes.is_empty() {
        return Err(Error::BadRequest("A ballot needs at least one vote".to_string()));
    }

    let candidate_ids: Vec<_> = votes.iter().map(|v| v.candidate_id).collect();
    let grade_ids: Vec<_> = votes.iter().map(|v| v.grade_id).collect();
    if election.count_members(&candidate_ids, ItemKind::Candidate) != votes.len()
        || election.count_members(&grade_ids, ItemKind::Grade) != votes.len()
    {
        return Err(Error::Forbidden(format!(
            "Ballot refers to candidates or grades outside election {}",
            election.election_ref
        )));
    }

    let distinct: HashSet<_> = candidate_ids.iter().collect();
    if distinct.len() != votes.len() {
        return Err(Error::InconsistentBallot(
            "A candidate was graded more than once".to_string(),
        ));
    }
    if distinct.len() != election.candidates.len() {
        return Err(Error::InconsistentBallot(format!(
            "Every candidate must be graded: expected {}, got {}",
            election.candidates.len(),
            distinct.len()
        )));
    }

    Ok(())
}

/// Check that an update replaces every vote of the ballot at once.
pub fn check_update_cardinality(token_votes: &[VoteId], submitted: &[VoteSpec]) -> Result<()> {
    if submitted.is_empty() {
        return Err(Error::BadRequest("A ballot needs at least one vote".to_string()));
    }
    if token_votes.len() != submitted.len() {
        return Err(Error::InconsistentBallot(format!(
            "This ballot has {} votes, but {} were submitted",
            token_votes.len(),
            submitted.len()
        )));
    }
    Ok(())
}

/// Write the submitted grades onto the existing votes.
///
/// Votes keep their IDs; the submitted votes are assigned in order to the existing ones in
/// ascending ID order.
pub fn assign_votes(
    mut existing: Vec<Vote>,
    submitted: &[VoteSpec],
    now: DateTime<Utc>,
) -> Vec<Vote> {
    existing.sort_unstable_by_key(|vote| vote.id);
    for (vote, spec) in existing.iter_mut().zip(submitted) {
        vote.candidate_id = Some(spec.candidate_id);
        vote.grade_id = Some(spec.grade_id);
        vote.date_modified = now;
    }
    existing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::db::vote::VoteCore;

    // Example election: candidates 1 and 2, grades 3 (Good) and 4 (Bad).
    fn vote(candidate_id: u32, grade_id: u32) -> VoteSpec {
        VoteSpec {
            candidate_id,
            grade_id,
        }
    }

    #[test]
    fn accepts_one_vote_per_candidate() {
        let election = Election::example(Utc::now());
        validate_ballot(&election, &[vote(1, 3), vote(2, 4)]).unwrap();
        validate_ballot(&election, &[vote(2, 3), vote(1, 3)]).unwrap();
    }

    #[test]
    fn rejects_empty_ballot() {
        let election = Election::example(Utc::now());
        assert!(matches!(
            validate_ballot(&election, &[]),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_missing_candidate() {
        let election = Election::example(Utc::now());
        assert!(matches!(
            validate_ballot(&election, &[vote(1, 3)]),
            Err(Error::InconsistentBallot(_))
        ));
    }

    #[test]
    fn rejects_duplicate_candidate() {
        let election = Election::example(Utc::now());
        assert!(matches!(
            validate_ballot(&election, &[vote(1, 3), vote(1, 4)]),
            Err(Error::InconsistentBallot(_))
        ));
        assert!(matches!(
            validate_ballot(&election, &[vote(1, 3), vote(2, 3), vote(1, 4)]),
            Err(Error::InconsistentBallot(_))
        ));
    }

    #[test]
    fn rejects_foreign_ids() {
        let election = Election::example(Utc::now());
        // Unknown candidate.
        assert!(matches!(
            validate_ballot(&election, &[vote(1, 3), vote(9, 3)]),
            Err(Error::Forbidden(_))
        ));
        // Unknown grade.
        assert!(matches!(
            validate_ballot(&election, &[vote(1, 3), vote(2, 9)]),
            Err(Error::Forbidden(_))
        ));
        // Grade ID used as a candidate.
        assert!(matches!(
            validate_ballot(&election, &[vote(1, 3), vote(3, 3)]),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn update_must_replace_every_vote() {
        check_update_cardinality(&[10, 11], &[vote(1, 3), vote(2, 4)]).unwrap();
        assert!(matches!(
            check_update_cardinality(&[10, 11], &[vote(1, 3)]),
            Err(Error::InconsistentBallot(_))
        ));
        assert!(matches!(
            check_update_cardinality(&[10, 11], &[]),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn assigned_votes_keep_their_ids() {
        let then = Utc::now();
        let now = then + chrono::Duration::minutes(1);
        let existing = vec![
            Vote {
                id: 11,
                vote: VoteCore::placeholder("qwertyuiop", then),
            },
            Vote {
                id: 10,
                vote: VoteCore::placeholder("qwertyuiop", then),
            },
        ];
        let assigned = assign_votes(existing, &[vote(1, 3), vote(2, 4)], now);
        assert_eq!(assigned[0].id, 10);
        assert_eq!(assigned[0].candidate_id, Some(1));
        assert_eq!(assigned[1].id, 11);
        assert_eq!(assigned[1].grade_id, Some(4));
        assert!(assigned.iter().all(|v| v.date_modified == now && v.date_created == then));
    }
}
