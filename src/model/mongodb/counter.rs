use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// Allocates election IDs.
pub const ELECTION_ID_COUNTER: &str = "election_id";
/// Allocates candidate and grade IDs.
pub const ITEM_ID_COUNTER: &str = "item_id";
/// Allocates vote IDs.
pub const VOTE_ID_COUNTER: &str = "vote_id";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Create the counter with the given name, starting at 1, unless it already exists.
    pub async fn ensure_exists(counters: &Coll<Counter>, id: &str) -> Result<()> {
        let update = doc! {
            "$setOnInsert": { "next": 1_i64 }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        counters
            .update_one(doc! { "_id": id }, update, options)
            .await?;
        Ok(())
    }

    /// Atomically reserve `count` consecutive values of the named counter, returning the first.
    pub async fn reserve(counters: &Coll<Counter>, id: &str, count: u32) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": i64::from(count) }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| {
                Error::InconsistentState(format!("Failed to find counter with ID {id}"))
            })?;
        Ok(counter.next)
    }
}
