use std::ops::Deref;

use mongodb::{
    bson::{doc, Document},
    error::Error as DbError,
    options::IndexOptions,
    Collection, Database, IndexModel,
};

use crate::model::db::{election::Election, vote::Vote};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Filter on an integer `_id`. Our IDs are `u32`, which BSON stores as 64-bit integers.
pub fn id_filter(id: u32) -> Document {
    doc! { "_id": i64::from(id) }
}

/// Filter on any of the given integer `_id`s.
pub fn ids_filter(ids: &[u32]) -> Document {
    let ids: Vec<i64> = ids.iter().copied().map(i64::from).collect();
    doc! { "_id": { "$in": ids } }
}

// Election collection
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}

// Vote collection
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}

// Counter collection
const COUNTERS: &str = "counters";
impl MongoCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Election collection.
    let unique = IndexOptions::builder().unique(true).build();
    let ref_index = IndexModel::builder()
        .keys(doc! {"ref": 1})
        .options(unique)
        .build();
    Coll::<Election>::from_db(db)
        .create_index(ref_index, None)
        .await?;

    // Vote collection.
    let vote_index = IndexModel::builder()
        .keys(doc! {"election_ref": 1, "grade_id": 1})
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(vote_index, None)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use mongodb::bson::Bson;

    use super::*;

    #[test]
    fn ids_are_stored_as_64_bit() {
        assert_eq!(id_filter(7).get("_id"), Some(&Bson::Int64(7)));
        assert_eq!(
            ids_filter(&[1, 2]),
            doc! { "_id": { "$in": [Bson::Int64(1), Bson::Int64(2)] } }
        );
    }
}
