use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::majority_judgment::{rank, MeritProfile, RankingError};
use crate::model::{
    api::results::ElectionResults,
    auth::TokenService,
    common::election::{CandidateId, ElectionIdent},
    db::{election::Election, vote::Vote},
};
use crate::store::Store;

use super::find_election;

/// Tally the cast votes of an election into one merit profile per candidate, in candidate
/// order. Every profile has an entry for every grade value.
pub fn merit_profiles(
    election: &Election,
    votes: &[Vote],
) -> Result<Vec<(CandidateId, MeritProfile)>> {
    let empty: MeritProfile = election.grades.iter().map(|g| (g.value, 0)).collect();
    let mut profiles: Vec<_> = election
        .candidates
        .iter()
        .map(|c| (c.id, empty.clone()))
        .collect();

    for vote in votes {
        let (Some(candidate_id), Some(grade_id)) = (vote.candidate_id, vote.grade_id) else {
            continue;
        };
        let grade = election.grade(grade_id).ok_or_else(|| {
            Error::InconsistentState(format!("Vote {} has unknown grade {grade_id}", vote.id))
        })?;
        let (_, profile) = profiles
            .iter_mut()
            .find(|(id, _)| *id == candidate_id)
            .ok_or_else(|| {
                Error::InconsistentState(format!(
                    "Vote {} has unknown candidate {candidate_id}",
                    vote.id
                ))
            })?;
        *profile.entry(grade.value).or_default() += 1;
    }

    Ok(profiles)
}

/// Rank the candidates of an election, if its results may be shown.
///
/// `token` is only checked when the election requires one for its results.
pub async fn get_results(
    store: &dyn Store,
    tokens: &TokenService,
    ident: &ElectionIdent,
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ElectionResults> {
    let election = find_election(store, ident).await?;
    let scope = if election.auth_for_result {
        token.map(|token| tokens.verify(token)).transpose()?
    } else {
        None
    };
    election.check_results_visible(now, scope.as_ref().map(|payload| payload.election()))?;

    let votes = store.votes_for_election(&election.election_ref).await?;
    let profiles = merit_profiles(&election, &votes)?;
    let ranked = rank(profiles.clone()).map_err(|e| match e {
        RankingError::NoRecordedVotes => Error::NoRecordedVotes(election.election_ref.clone()),
        RankingError::EmptyProfile(position) => Error::InconsistentState(format!(
            "Candidate {} of election {} has no votes",
            profiles[position].0, election.election_ref
        )),
    })?;

    Ok(ElectionResults {
        ranking: ranked
            .into_iter()
            .enumerate()
            .map(|(position, candidate_id)| (candidate_id, position + 1))
            .collect(),
        merit_profile: profiles.into_iter().collect(),
        election: election.into(),
    })
}
