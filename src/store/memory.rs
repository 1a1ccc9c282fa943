use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionId, ElectionIdent, VoteId},
    db::{
        election::{Election, NewElection},
        vote::{Vote, VoteCore},
    },
};

use super::{Store, VoteCounts};

#[derive(Debug)]
struct Tables {
    elections: BTreeMap<ElectionId, Election>,
    votes: BTreeMap<VoteId, Vote>,
    next_election_id: ElectionId,
    next_item_id: u32,
    next_vote_id: VoteId,
}

impl Tables {
    fn election_by_ref(&self, election_ref: &str) -> Option<&Election> {
        self.elections
            .values()
            .find(|e| e.election_ref == election_ref)
    }

    fn insert_votes(&mut self, votes: Vec<VoteCore>) -> Vec<Vote> {
        votes
            .into_iter()
            .map(|vote| {
                let vote = Vote {
                    id: self.next_vote_id,
                    vote,
                };
                self.next_vote_id += 1;
                self.votes.insert(vote.id, vote.clone());
                vote
            })
            .collect()
    }
}

/// A store that keeps everything in memory. Every operation holds one lock, so each is atomic.
///
/// Clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables {
                elections: BTreeMap::new(),
                votes: BTreeMap::new(),
                next_election_id: 1,
                next_item_id: 1,
                next_vote_id: 1,
            })),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_election(
        &self,
        election: NewElection,
        votes: Vec<VoteCore>,
    ) -> Result<Option<(Election, Vec<Vote>)>> {
        let mut tables = self.tables.lock().await;
        if tables.election_by_ref(&election.election_ref).is_some() {
            return Ok(None);
        }

        let id = tables.next_election_id;
        tables.next_election_id += 1;
        let mut next_item_id = tables.next_item_id;
        let election = election.into_election(id, || {
            next_item_id += 1;
            next_item_id - 1
        });
        tables.next_item_id = next_item_id;
        tables.elections.insert(id, election.clone());

        let votes = tables.insert_votes(votes);
        Ok(Some((election, votes)))
    }

    async fn election(&self, ident: &ElectionIdent) -> Result<Option<Election>> {
        let tables = self.tables.lock().await;
        let election = match ident {
            ElectionIdent::ById(id) => tables.elections.get(id),
            ElectionIdent::ByRef(election_ref) => tables.election_by_ref(election_ref),
        };
        Ok(election.cloned())
    }

    async fn replace_election(
        &self,
        election: &Election,
        expected_modified: DateTime<Utc>,
        new_votes: Vec<VoteCore>,
    ) -> Result<Option<Vec<Vote>>> {
        let mut tables = self.tables.lock().await;
        match tables.elections.get_mut(&election.id) {
            Some(stored) if stored.date_modified == expected_modified => {
                *stored = election.clone();
            }
            Some(_) => return Ok(None),
            None => return Err(Error::not_found(format!("Election {}", election.id))),
        }
        Ok(Some(tables.insert_votes(new_votes)))
    }

    async fn insert_votes(&self, votes: Vec<VoteCore>) -> Result<Vec<Vote>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.insert_votes(votes))
    }

    async fn votes_by_ids(&self, ids: &[VoteId]) -> Result<Vec<Vote>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.votes.get(id))
            .cloned()
            .collect())
    }

    async fn update_votes(&self, election_ref: &str, votes: &[Vote]) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let all_members = votes.iter().all(|vote| {
            tables
                .votes
                .get(&vote.id)
                .map_or(false, |stored| stored.election_ref == election_ref)
        });
        if !all_members {
            return Err(Error::Forbidden(format!(
                "Votes do not belong to election {election_ref}"
            )));
        }
        for vote in votes {
            tables.votes.insert(vote.id, vote.clone());
        }
        Ok(())
    }

    async fn votes_for_election(&self, election_ref: &str) -> Result<Vec<Vote>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .votes
            .values()
            .filter(|vote| vote.election_ref == election_ref)
            .cloned()
            .collect())
    }

    async fn count_votes(&self, election_ref: &str) -> Result<VoteCounts> {
        let tables = self.tables.lock().await;
        Ok(tables
            .votes
            .values()
            .filter(|vote| vote.election_ref == election_ref)
            .fold(VoteCounts::default(), |counts, vote| VoteCounts {
                total: counts.total + 1,
                cast: counts.cast + u64::from(vote.is_cast()),
            }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn new_election(election_ref: &str) -> NewElection {
        let election = Election::example(Utc::now());
        NewElection {
            election_ref: election_ref.to_string(),
            election: election.election,
            candidates: election.candidates.into_iter().map(|c| c.candidate).collect(),
            grades: election.grades.into_iter().map(|g| g.grade).collect(),
        }
    }

    #[backend_test]
    async fn ids_are_unique_across_elections(store: MemoryStore) {
        let (first, _) = store
            .insert_election(new_election("first"), vec![])
            .await
            .unwrap()
            .unwrap();
        let (second, _) = store
            .insert_election(new_election("second"), vec![])
            .await
            .unwrap()
            .unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        let first_ids: Vec<_> = first.candidates.iter().map(|c| c.id).collect();
        let second_ids: Vec<_> = second.candidates.iter().map(|c| c.id).collect();
        assert_eq!(first_ids, vec![1, 2]);
        assert_eq!(second_ids, vec![5, 6]);
    }

    #[backend_test]
    async fn duplicate_ref_is_refused(store: MemoryStore) {
        let placeholder = VoteCore::placeholder("taken", Utc::now());
        assert!(store
            .insert_election(new_election("taken"), vec![])
            .await
            .unwrap()
            .is_some());
        assert!(store
            .insert_election(new_election("taken"), vec![placeholder])
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.count_votes("taken").await.unwrap().total, 0);
    }

    #[backend_test]
    async fn lookup_by_id_or_ref(store: MemoryStore) {
        let (election, _) = store
            .insert_election(new_election("lookup"), vec![])
            .await
            .unwrap()
            .unwrap();
        let by_id = store.election(&ElectionIdent::ById(election.id)).await.unwrap();
        let by_ref = store.election(&ElectionIdent::from("lookup")).await.unwrap();
        assert_eq!(by_id, Some(election.clone()));
        assert_eq!(by_ref, Some(election));
        assert_eq!(store.election(&ElectionIdent::from("nope")).await.unwrap(), None);
    }

    #[backend_test]
    async fn stale_replace_is_refused(store: MemoryStore) {
        let (election, _) = store
            .insert_election(new_election("stale"), vec![])
            .await
            .unwrap()
            .unwrap();
        let read_at = election.date_modified;

        let mut first = election.clone();
        first.name = "First".to_string();
        first.date_modified = read_at + Duration::seconds(1);
        assert!(store
            .replace_election(&first, read_at, vec![])
            .await
            .unwrap()
            .is_some());

        let mut second = election;
        second.name = "Second".to_string();
        let new_vote = VoteCore::placeholder("stale", Utc::now());
        assert!(store
            .replace_election(&second, read_at, vec![new_vote])
            .await
            .unwrap()
            .is_none());

        let stored = store.election(&ElectionIdent::from("stale")).await.unwrap().unwrap();
        assert_eq!(stored.name, "First");
        assert_eq!(store.count_votes("stale").await.unwrap().total, 0);
    }

    #[backend_test]
    async fn update_rechecks_membership(store: MemoryStore) {
        let now = Utc::now();
        let ours = store
            .insert_votes(vec![VoteCore::placeholder("ours", now)])
            .await
            .unwrap();
        let theirs = store
            .insert_votes(vec![VoteCore::placeholder("theirs", now)])
            .await
            .unwrap();

        let mut changed: Vec<_> = ours.iter().chain(&theirs).cloned().collect();
        for vote in &mut changed {
            vote.grade_id = Some(1);
        }
        assert!(matches!(
            store.update_votes("ours", &changed).await,
            Err(Error::Forbidden(_))
        ));
        assert_eq!(store.count_votes("ours").await.unwrap().cast, 0);

        store.update_votes("ours", &changed[..1]).await.unwrap();
        assert_eq!(
            store.count_votes("ours").await.unwrap(),
            VoteCounts { total: 1, cast: 1 }
        );
        let stored = store.votes_by_ids(&[ours[0].id, 999]).await.unwrap();
        assert_eq!(stored, changed[..1].to_vec());
    }
}
