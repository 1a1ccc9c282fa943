mod collection;
mod counter;
mod errors;

pub use collection::{ensure_indexes_exist, id_filter, ids_filter, Coll, MongoCollection};
pub use counter::{Counter, ELECTION_ID_COUNTER, ITEM_ID_COUNTER, VOTE_ID_COUNTER};
pub use errors::is_duplicate_key_error;
