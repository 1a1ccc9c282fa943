//! The use cases of the backend.
//!
//! Each operation takes its collaborators and the current time explicitly, so the HTTP layer
//! stays a thin wrapper and tests can pin the clock.

mod ballot;
mod election;
mod results;

pub use ballot::{create_ballot, get_ballot, update_ballot};
pub use election::{create_election, get_election, get_progress, update_election};
pub use results::{get_results, merit_profiles};

use crate::error::{Error, Result};
use crate::model::{common::election::ElectionIdent, db::election::Election};
use crate::store::Store;

/// Look up an election, failing if it does not exist.
async fn find_election(store: &dyn Store, ident: &ElectionIdent) -> Result<Election> {
    store
        .election(ident)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {ident}")))
}
