use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, to_bson},
    error::Error as DbError,
    Client, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionIdent, VoteId},
    db::{
        election::{Election, NewElection},
        vote::{Vote, VoteCore},
    },
    mongodb::{
        ensure_indexes_exist, id_filter, ids_filter, is_duplicate_key_error, Coll, Counter,
        ELECTION_ID_COUNTER, ITEM_ID_COUNTER, VOTE_ID_COUNTER,
    },
};

use super::{Store, VoteCounts};

/// A store backed by MongoDB. Multi-document writes run in transactions, so the server must
/// be a replica set.
pub struct MongoStore {
    client: Client,
    elections: Coll<Election>,
    votes: Coll<Vote>,
    counters: Coll<Counter>,
}

impl MongoStore {
    /// Wrap the given database, creating any missing indexes and counters.
    pub async fn connect(client: Client, db: Database) -> Result<Self> {
        ensure_indexes_exist(&db).await?;
        let counters = Coll::from_db(&db);
        for id in [ELECTION_ID_COUNTER, ITEM_ID_COUNTER, VOTE_ID_COUNTER] {
            Counter::ensure_exists(&counters, id).await?;
        }
        Ok(Self {
            client,
            elections: Coll::from_db(&db),
            votes: Coll::from_db(&db),
            counters,
        })
    }

    /// Reserve IDs for the given votes. Reserved IDs are never reused, even if the votes are
    /// not stored in the end.
    async fn allocate_votes(&self, votes: Vec<VoteCore>) -> Result<Vec<Vote>> {
        if votes.is_empty() {
            return Ok(vec![]);
        }
        let count = u32::try_from(votes.len())
            .map_err(|_| Error::invalid(format!("Cannot store {} votes at once", votes.len())))?;
        let first = Counter::reserve(&self.counters, VOTE_ID_COUNTER, count).await?;
        Ok(votes
            .into_iter()
            .zip(first..)
            .map(|(vote, id)| Vote { id, vote })
            .collect())
    }
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_election(
        &self,
        election: NewElection,
        votes: Vec<VoteCore>,
    ) -> Result<Option<(Election, Vec<Vote>)>> {
        // Allocate every ID up front.
        let id = Counter::reserve(&self.counters, ELECTION_ID_COUNTER, 1).await?;
        let item_count = u32::try_from(election.num_item_ids())
            .map_err(|_| Error::invalid("Too many candidates and grades"))?;
        let mut next_item = Counter::reserve(&self.counters, ITEM_ID_COUNTER, item_count).await?;
        let election = election.into_election(id, || {
            next_item += 1;
            next_item - 1
        });
        let votes = self.allocate_votes(votes).await?;

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        match self
            .elections
            .insert_one_with_session(&election, None, &mut session)
            .await
        {
            Ok(_) => {}
            Err(e) if is_duplicate_key_error(&e) => {
                session.abort_transaction().await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
        if !votes.is_empty() {
            self.votes
                .insert_many_with_session(&votes, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(Some((election, votes)))
    }

    async fn election(&self, ident: &ElectionIdent) -> Result<Option<Election>> {
        let filter = match ident {
            ElectionIdent::ById(id) => id_filter(*id),
            ElectionIdent::ByRef(election_ref) => doc! { "ref": election_ref },
        };
        Ok(self.elections.find_one(filter, None).await?)
    }

    async fn replace_election(
        &self,
        election: &Election,
        expected_modified: DateTime<Utc>,
        new_votes: Vec<VoteCore>,
    ) -> Result<Option<Vec<Vote>>> {
        // Dates are compared in the form they were stored in.
        let expected_modified = to_bson(&expected_modified).map_err(DbError::from)?;
        let mut filter = id_filter(election.id);
        filter.insert("date_modified", expected_modified);
        let votes = self.allocate_votes(new_votes).await?;

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let result = self
            .elections
            .replace_one_with_session(filter, election, None, &mut session)
            .await?;
        if result.matched_count == 0 {
            session.abort_transaction().await?;
            return Ok(None);
        }
        if !votes.is_empty() {
            self.votes
                .insert_many_with_session(&votes, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(Some(votes))
    }

    async fn insert_votes(&self, votes: Vec<VoteCore>) -> Result<Vec<Vote>> {
        let votes = self.allocate_votes(votes).await?;
        if !votes.is_empty() {
            self.votes.insert_many(&votes, None).await?;
        }
        Ok(votes)
    }

    async fn votes_by_ids(&self, ids: &[VoteId]) -> Result<Vec<Vote>> {
        let votes = self.votes.find(ids_filter(ids), None).await?;
        Ok(votes.try_collect().await?)
    }

    async fn update_votes(&self, election_ref: &str, votes: &[Vote]) -> Result<()> {
        let ids: Vec<_> = votes.iter().map(|vote| vote.id).collect();
        let mut filter = ids_filter(&ids);
        filter.insert("election_ref", election_ref);

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let members = self
            .votes
            .count_documents_with_session(filter, None, &mut session)
            .await?;
        if members != votes.len() as u64 {
            session.abort_transaction().await?;
            return Err(Error::Forbidden(format!(
                "Votes do not belong to election {election_ref}"
            )));
        }
        for vote in votes {
            self.votes
                .replace_one_with_session(id_filter(vote.id), vote, None, &mut session)
                .await?;
        }

        session.commit_transaction().await?;
        Ok(())
    }

    async fn votes_for_election(&self, election_ref: &str) -> Result<Vec<Vote>> {
        let votes = self
            .votes
            .find(doc! { "election_ref": election_ref }, None)
            .await?;
        Ok(votes.try_collect().await?)
    }

    async fn count_votes(&self, election_ref: &str) -> Result<VoteCounts> {
        let total = self
            .votes
            .count_documents(doc! { "election_ref": election_ref }, None)
            .await?;
        let cast = self
            .votes
            .count_documents(
                doc! { "election_ref": election_ref, "grade_id": { "$ne": null } },
                None,
            )
            .await?;
        Ok(VoteCounts { total, cast })
    }
}
