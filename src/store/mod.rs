//! Persistence for elections and votes.
//!
//! The services only talk to a [`Store`], so the same code runs against MongoDB in production
//! and an in-memory store in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    common::election::{ElectionIdent, VoteId},
    db::{
        election::{Election, NewElection},
        vote::{Vote, VoteCore},
    },
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Vote totals for one election.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    /// Every vote, including unfilled invitations.
    pub total: u64,
    /// Votes that carry a grade.
    pub cast: u64,
}

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Store a new election together with its first votes, allocating all IDs.
    ///
    /// Returns `None`, storing nothing, if the ref is already taken.
    async fn insert_election(
        &self,
        election: NewElection,
        votes: Vec<VoteCore>,
    ) -> Result<Option<(Election, Vec<Vote>)>>;

    /// Find an election by ID or ref.
    async fn election(&self, ident: &ElectionIdent) -> Result<Option<Election>>;

    /// Replace an election and insert new votes for it, as one unit.
    ///
    /// Returns `None`, storing nothing, if the stored election's `date_modified` is no longer
    /// `expected_modified`.
    async fn replace_election(
        &self,
        election: &Election,
        expected_modified: DateTime<Utc>,
        new_votes: Vec<VoteCore>,
    ) -> Result<Option<Vec<Vote>>>;

    /// Store new votes, allocating their IDs.
    async fn insert_votes(&self, votes: Vec<VoteCore>) -> Result<Vec<Vote>>;

    /// Find the votes with the given IDs. Missing IDs are skipped.
    async fn votes_by_ids(&self, ids: &[VoteId]) -> Result<Vec<Vote>>;

    /// Overwrite existing votes, as one unit.
    ///
    /// Fails with `Forbidden`, changing nothing, unless every vote is already stored under the
    /// given election.
    async fn update_votes(&self, election_ref: &str, votes: &[Vote]) -> Result<()>;

    /// Every vote of an election.
    async fn votes_for_election(&self, election_ref: &str) -> Result<Vec<Vote>>;

    /// Count the votes of an election.
    async fn count_votes(&self, election_ref: &str) -> Result<VoteCounts>;
}

/// The store as managed by Rocket.
pub type StoreHandle = Arc<dyn Store>;
