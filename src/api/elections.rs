use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    api::election::{
        ElectionAndInvites, ElectionDescription, ElectionSpec, ElectionUpdate, Progress,
    },
    auth::{BearerToken, TokenService},
    common::election::ElectionIdent,
};
use crate::service;
use crate::store::StoreHandle;

pub fn routes() -> Vec<Route> {
    routes![create_election, get_election, update_election, election_progress]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    spec: Json<ElectionSpec>,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
    config: &State<Config>,
) -> Result<Json<ElectionAndInvites>> {
    let created = service::create_election(
        store.inner().as_ref(),
        tokens,
        config,
        spec.into_inner(),
        Utc::now(),
    )
    .await?;
    Ok(Json(created))
}

#[get("/elections/<ident>")]
async fn get_election(
    ident: ElectionIdent,
    store: &State<StoreHandle>,
) -> Result<Json<ElectionDescription>> {
    let election = service::get_election(store.inner().as_ref(), &ident).await?;
    Ok(Json(election))
}

#[put("/elections/<election_ref>", data = "<update>", format = "json")]
async fn update_election(
    election_ref: &str,
    token: BearerToken,
    update: Json<ElectionUpdate>,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
    config: &State<Config>,
) -> Result<Json<ElectionAndInvites>> {
    let updated = service::update_election(
        store.inner().as_ref(),
        tokens,
        config,
        election_ref,
        token.as_str(),
        update.into_inner(),
        Utc::now(),
    )
    .await?;
    Ok(Json(updated))
}

#[get("/elections/<election_ref>/progress")]
async fn election_progress(
    election_ref: &str,
    token: BearerToken,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
) -> Result<Json<Progress>> {
    let progress =
        service::get_progress(store.inner().as_ref(), tokens, election_ref, token.as_str())
            .await?;
    Ok(Json(progress))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::Client,
        serde::json::{serde_json, Value},
    };

    use super::*;

    fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {token}"))
    }

    async fn create(client: &Client, spec: &ElectionSpec) -> Value {
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test]
    async fn create_and_get(client: Client) {
        let created = create(&client, &ElectionSpec::example()).await;
        assert!(created["admin"].is_string());
        assert_eq!(created["invites"], Value::Array(vec![]));
        let election_ref = created["ref"].as_str().unwrap().to_string();
        let id = created["id"].as_u64().unwrap() as u32;

        for ident in [ElectionIdent::ById(id), ElectionIdent::ByRef(election_ref.clone())] {
            let response = client.get(uri!(get_election(ident))).dispatch().await;
            assert_eq!(Status::Ok, response.status());
            let election: Value = response.into_json().await.unwrap();
            assert_eq!(election["ref"], election_ref.as_str());
            assert_eq!(election["candidates"][0]["name"], "A");
            assert!(election.get("admin").is_none());
        }
    }

    #[backend_test]
    async fn missing_election_is_json_404(client: Client) {
        for path in ["/elections/nosuchelection", "/elections/123456", "/elections/not-a-ref"] {
            let response = client.get(path).dispatch().await;
            assert_eq!(Status::NotFound, response.status());
            let body: Value = response.into_json().await.unwrap();
            assert_eq!(body["error"], "not_found");
        }
    }

    #[backend_test]
    async fn invalid_spec_is_422(client: Client) {
        let mut spec = ElectionSpec::example();
        spec.name = String::new();
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "invalid_request");
    }

    #[backend_test]
    async fn update_needs_bearer_admin(client: Client) {
        let created = create(&client, &ElectionSpec::example()).await;
        let election_ref = created["ref"].as_str().unwrap();
        let update = r#"{"name": "Renamed"}"#;

        let response = client
            .put(uri!(update_election(election_ref)))
            .header(ContentType::JSON)
            .body(update)
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "unauthorized");

        let response = client
            .put(uri!(update_election(election_ref)))
            .header(ContentType::JSON)
            .header(bearer("garbage"))
            .body(update)
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .put(uri!(update_election(election_ref)))
            .header(ContentType::JSON)
            .header(bearer(created["admin"].as_str().unwrap()))
            .body(update)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated: Value = response.into_json().await.unwrap();
        assert_eq!(updated["name"], "Renamed");
    }

    #[backend_test]
    async fn admin_of_another_election_is_forbidden(client: Client) {
        let first = create(&client, &ElectionSpec::example()).await;
        let second = create(&client, &ElectionSpec::example()).await;
        let response = client
            .get(uri!(election_progress(first["ref"].as_str().unwrap())))
            .header(bearer(second["admin"].as_str().unwrap()))
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "wrong_election");
    }

    #[backend_test]
    async fn progress_of_restricted_election(client: Client) {
        let created = create(&client, &ElectionSpec::example_restricted(4)).await;
        assert_eq!(created["invites"].as_array().unwrap().len(), 4);

        let response = client
            .get(uri!(election_progress(created["ref"].as_str().unwrap())))
            .header(bearer(created["admin"].as_str().unwrap()))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let progress: Progress = response.into_json().await.unwrap();
        assert_eq!(
            progress,
            Progress {
                num_voters: 4,
                num_voters_voted: 0
            }
        );
    }
}
