use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::election::{
        ElectionAndInvites, ElectionDescription, ElectionSpec, ElectionUpdate, Progress,
    },
    auth::TokenService,
    common::election::{generate_ref, ElectionIdent},
    db::vote::{Vote, VoteCore},
};
use crate::store::Store;

use super::find_election;

/// Placeholder votes for `num_voters` invited voters.
fn placeholders(
    election_ref: &str,
    num_voters: u32,
    num_candidates: usize,
    now: DateTime<Utc>,
) -> Vec<VoteCore> {
    let count = num_voters as usize * num_candidates;
    (0..count)
        .map(|_| VoteCore::placeholder(election_ref, now))
        .collect()
}

/// One ballot token per invited voter, each covering one vote per candidate.
fn invite_tokens(
    tokens: &TokenService,
    election_ref: &str,
    votes: &[Vote],
    num_candidates: usize,
) -> Result<Vec<String>> {
    votes
        .chunks(num_candidates.max(1))
        .map(|voter_votes| tokens.issue_ballot(election_ref, voter_votes.iter().map(|v| v.id)))
        .collect()
}

/// Create an election under a fresh ref, along with its invitations and admin token.
pub async fn create_election(
    store: &dyn Store,
    tokens: &TokenService,
    config: &Config,
    spec: ElectionSpec,
    now: DateTime<Utc>,
) -> Result<ElectionAndInvites> {
    let template = spec.into_new_election(String::new(), now);
    template.validate(config)?;
    let num_candidates = template.candidates.len();
    let num_voters = template.election.num_voters;

    for attempt in 1..=config.ref_attempts() {
        let election_ref = generate_ref(&mut rand::thread_rng(), config.ref_length());
        let mut new_election = template.clone();
        new_election.election_ref = election_ref.clone();
        let invites = placeholders(&election_ref, num_voters, num_candidates, now);

        match store.insert_election(new_election, invites).await? {
            Some((election, votes)) => {
                info!(
                    "Created election {} ({}) with {num_voters} invites",
                    election.election_ref, election.id
                );
                let invites = invite_tokens(tokens, &election_ref, &votes, num_candidates)?;
                let admin = tokens.issue_admin(&election_ref)?;
                return Ok(ElectionAndInvites {
                    election: election.into(),
                    invites,
                    admin: Some(admin),
                });
            }
            None => warn!(
                "Election ref {election_ref} is taken (attempt {attempt}/{})",
                config.ref_attempts()
            ),
        }
    }

    Err(Error::InconsistentState(format!(
        "Could not allocate a unique election ref in {} attempts",
        config.ref_attempts()
    )))
}

/// Get an election by ID or ref.
pub async fn get_election(
    store: &dyn Store,
    ident: &ElectionIdent,
) -> Result<ElectionDescription> {
    Ok(find_election(store, ident).await?.into())
}

/// Apply an admin's changes to an election, issuing any newly requested invitations.
pub async fn update_election(
    store: &dyn Store,
    tokens: &TokenService,
    config: &Config,
    election_ref: &str,
    token: &str,
    update: ElectionUpdate,
    now: DateTime<Utc>,
) -> Result<ElectionAndInvites> {
    tokens.verify(token)?.require_admin(election_ref)?;
    let mut election = find_election(store, &ElectionIdent::from(election_ref)).await?;
    let read_modified = election.date_modified;

    if let Some(restricted) = update.restricted {
        if restricted != election.restricted {
            return Err(Error::invalid("An election cannot change whether it is restricted"));
        }
    }

    if update.patch.changes_start(&election) && store.count_votes(election_ref).await?.cast > 0 {
        return Err(Error::ElectionIsActive(election_ref.to_string()));
    }

    let mut new_voters = 0;
    if let Some(num_voters) = update.num_voters {
        if num_voters < election.num_voters {
            return Err(Error::invalid(format!(
                "{} voters are already invited",
                election.num_voters
            )));
        }
        new_voters = num_voters - election.num_voters;
        election.num_voters = num_voters;
    }

    if let Some(candidates) = update.candidates {
        election.replace_candidates(candidates)?;
    }
    if let Some(grades) = update.grades {
        election.replace_grades(grades)?;
    }
    update.patch.apply(&mut election);
    // Must move forward, so concurrent updates can tell they raced.
    election.date_modified = now.max(read_modified + Duration::microseconds(1));
    election.validate(config)?;

    let num_candidates = election.candidates.len();
    let new_votes = placeholders(election_ref, new_voters, num_candidates, now);
    let votes = store
        .replace_election(&election, read_modified, new_votes)
        .await?
        .ok_or_else(|| {
            Error::Conflict(format!(
                "Election {election_ref} was modified concurrently, try again"
            ))
        })?;

    if new_voters > 0 {
        info!("Invited {new_voters} more voters to election {election_ref}");
    }
    let invites = invite_tokens(tokens, election_ref, &votes, num_candidates)?;
    Ok(ElectionAndInvites {
        election: election.into(),
        invites,
        admin: None,
    })
}

/// How many of the invited voters have voted.
pub async fn get_progress(
    store: &dyn Store,
    tokens: &TokenService,
    election_ref: &str,
    token: &str,
) -> Result<Progress> {
    tokens.verify(token)?.require_admin(election_ref)?;
    let election = find_election(store, &ElectionIdent::from(election_ref)).await?;
    let counts = store.count_votes(election_ref).await?;
    let num_candidates = election.candidates.len().max(1) as u64;
    Ok(Progress {
        num_voters: counts.total / num_candidates,
        num_voters_voted: counts.cast / num_candidates,
    })
}
