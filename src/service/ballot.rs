use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    api::ballot::{BallotDescription, BallotSpec, BallotUpdate},
    auth::TokenService,
    ballot::{assign_votes, check_update_cardinality, validate_ballot},
    common::election::ElectionIdent,
    db::vote::VoteCore,
};
use crate::store::Store;

use super::find_election;

/// Cast a ballot directly on an unrestricted election.
pub async fn create_ballot(
    store: &dyn Store,
    tokens: &TokenService,
    spec: BallotSpec,
    now: DateTime<Utc>,
) -> Result<BallotDescription> {
    let election = find_election(store, &ElectionIdent::from(spec.election_ref.as_str())).await?;
    election.check_accepts_direct_ballots()?;
    election.check_accepts_votes(now)?;
    validate_ballot(&election, &spec.votes)?;

    let new_votes = spec
        .votes
        .iter()
        .map(|v| VoteCore::cast(election.election_ref.as_str(), v.candidate_id, v.grade_id, now))
        .collect();
    let votes = store.insert_votes(new_votes).await?;
    debug!(
        "Cast ballot with {} votes on election {}",
        votes.len(),
        election.election_ref
    );

    let token = tokens.issue_ballot(&election.election_ref, votes.iter().map(|v| v.id))?;
    Ok(BallotDescription::new(&votes, election, token))
}

/// Read the ballot a token gives access to.
pub async fn get_ballot(
    store: &dyn Store,
    tokens: &TokenService,
    token: &str,
) -> Result<BallotDescription> {
    let claims = tokens.verify(token)?.require_ballot()?;
    let election = find_election(store, &ElectionIdent::from(claims.election.as_str())).await?;

    let votes = store.votes_by_ids(&claims.votes).await?;
    if votes.len() != claims.votes.len() {
        return Err(Error::not_found("Votes of this ballot"));
    }
    if votes.iter().any(|vote| vote.election_ref != claims.election) {
        return Err(Error::Forbidden(format!(
            "Votes do not belong to election {}",
            claims.election
        )));
    }

    Ok(BallotDescription::new(&votes, election, token.to_string()))
}

/// Replace every vote of a ballot, keeping their identities.
pub async fn update_ballot(
    store: &dyn Store,
    tokens: &TokenService,
    token: &str,
    update: BallotUpdate,
    now: DateTime<Utc>,
) -> Result<BallotDescription> {
    let claims = tokens.verify(token)?.require_ballot()?;
    check_update_cardinality(&claims.votes, &update.votes)?;
    let election = find_election(store, &ElectionIdent::from(claims.election.as_str())).await?;
    election.check_accepts_votes(now)?;
    validate_ballot(&election, &update.votes)?;

    let existing = store.votes_by_ids(&claims.votes).await?;
    if existing.len() != claims.votes.len() {
        return Err(Error::not_found("Votes of this ballot"));
    }
    let votes = assign_votes(existing, &update.votes, now);
    store.update_votes(&claims.election, &votes).await?;
    debug!(
        "Updated ballot with {} votes on election {}",
        votes.len(),
        claims.election
    );

    let token = tokens.issue_ballot(&claims.election, votes.iter().map(|v| v.id))?;
    Ok(BallotDescription::new(&votes, election, token))
}
