use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::results::ElectionResults,
    auth::{BearerToken, TokenService},
    common::election::ElectionIdent,
};
use crate::service;
use crate::store::StoreHandle;

pub fn routes() -> Vec<Route> {
    routes![election_results]
}

/// A bearer token is only needed for elections that restrict their results.
#[get("/results/<ident>")]
async fn election_results(
    ident: ElectionIdent,
    token: Option<BearerToken>,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
) -> Result<Json<ElectionResults>> {
    let results = service::get_results(
        store.inner().as_ref(),
        tokens,
        &ident,
        token.as_ref().map(BearerToken::as_str),
        Utc::now(),
    )
    .await?;
    Ok(Json(results))
}
