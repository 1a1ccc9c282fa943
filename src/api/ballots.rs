use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::ballot::{BallotDescription, BallotSpec, BallotUpdate},
    auth::{BearerToken, TokenService},
};
use crate::service;
use crate::store::StoreHandle;

pub fn routes() -> Vec<Route> {
    routes![cast_ballot, get_ballot, update_ballot]
}

#[post("/ballots", data = "<ballot>", format = "json")]
async fn cast_ballot(
    ballot: Json<BallotSpec>,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
) -> Result<Json<BallotDescription>> {
    let ballot =
        service::create_ballot(store.inner().as_ref(), tokens, ballot.into_inner(), Utc::now())
            .await?;
    Ok(Json(ballot))
}

#[get("/ballots")]
async fn get_ballot(
    token: BearerToken,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
) -> Result<Json<BallotDescription>> {
    let ballot = service::get_ballot(store.inner().as_ref(), tokens, token.as_str()).await?;
    Ok(Json(ballot))
}

#[put("/ballots", data = "<update>", format = "json")]
async fn update_ballot(
    token: BearerToken,
    update: Json<BallotUpdate>,
    store: &State<StoreHandle>,
    tokens: &State<TokenService>,
) -> Result<Json<BallotDescription>> {
    let ballot = service::update_ballot(
        store.inner().as_ref(),
        tokens,
        token.as_str(),
        update.into_inner(),
        Utc::now(),
    )
    .await?;
    Ok(Json(ballot))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{json, serde_json, Value},
    };

    use super::*;
    use crate::model::api::election::ElectionSpec;

    fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {token}"))
    }

    async fn create(client: &Client, spec: &ElectionSpec) -> Value {
        let response = client
            .post("/elections")
            .header(ContentType::JSON)
            .body(serde_json::to_string(spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    /// Votes grading each candidate with the grade at the given position.
    fn votes(election: &Value, grades: [usize; 2]) -> Value {
        let votes: Vec<_> = grades
            .iter()
            .enumerate()
            .map(|(candidate, &grade)| {
                json!({
                    "candidate_id": election["candidates"][candidate]["id"],
                    "grade_id": election["grades"][grade]["id"],
                })
            })
            .collect();
        Value::Array(votes)
    }

    async fn error_code(response: LocalResponse<'_>) -> String {
        let body: Value = response.into_json().await.unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[backend_test]
    async fn cast_read_and_update(client: Client) {
        let election = create(&client, &ElectionSpec::example()).await;
        let ballot = json!({ "election_ref": election["ref"], "votes": votes(&election, [0, 1]) });
        let response = client
            .post(uri!(cast_ballot))
            .header(ContentType::JSON)
            .body(ballot.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let cast: Value = response.into_json().await.unwrap();
        assert_eq!(cast["votes"][0]["grade"]["name"], "Good");
        assert_eq!(cast["election"]["ref"], election["ref"]);
        let token = cast["token"].as_str().unwrap();

        let response = client
            .get(uri!(get_ballot))
            .header(bearer(token))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let read: Value = response.into_json().await.unwrap();
        assert_eq!(read, cast);

        let update = json!({ "votes": votes(&election, [1, 0]) });
        let response = client
            .put(uri!(update_ballot))
            .header(ContentType::JSON)
            .header(bearer(token))
            .body(update.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let updated: Value = response.into_json().await.unwrap();
        assert_eq!(updated["votes"][0]["id"], cast["votes"][0]["id"]);
        assert_eq!(updated["votes"][0]["grade"]["name"], "Bad");
    }

    #[backend_test]
    async fn ballot_errors(client: Client) {
        let election = create(&client, &ElectionSpec::example()).await;

        let empty = json!({ "election_ref": election["ref"], "votes": [] });
        let response = client
            .post(uri!(cast_ballot))
            .header(ContentType::JSON)
            .body(empty.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(error_code(response).await, "bad_request");

        let mut partial = votes(&election, [0, 1]);
        partial.as_array_mut().unwrap().pop();
        let partial = json!({ "election_ref": election["ref"], "votes": partial });
        let response = client
            .post(uri!(cast_ballot))
            .header(ContentType::JSON)
            .body(partial.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        assert_eq!(error_code(response).await, "inconsistent_ballot");

        let response = client.get(uri!(get_ballot)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(error_code(response).await, "unauthorized");

        // An admin token is not a ballot token.
        let response = client
            .get(uri!(get_ballot))
            .header(bearer(election["admin"].as_str().unwrap()))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn restricted_elections_take_invites(client: Client) {
        let election = create(&client, &ElectionSpec::example_restricted(2)).await;

        let ballot = json!({ "election_ref": election["ref"], "votes": votes(&election, [0, 1]) });
        let response = client
            .post(uri!(cast_ballot))
            .header(ContentType::JSON)
            .body(ballot.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
        assert_eq!(error_code(response).await, "election_restricted");

        let invite = election["invites"][0].as_str().unwrap();
        let response = client
            .get(uri!(get_ballot))
            .header(bearer(invite))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let unfilled: Value = response.into_json().await.unwrap();
        assert!(unfilled["votes"][0]["grade"].is_null());

        let update = json!({ "votes": votes(&election, [0, 0]) });
        let response = client
            .put(uri!(update_ballot))
            .header(ContentType::JSON)
            .header(bearer(invite))
            .body(update.to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client
            .get(format!("/elections/{}/progress", election["ref"].as_str().unwrap()))
            .header(bearer(election["admin"].as_str().unwrap()))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let progress: Value = response.into_json().await.unwrap();
        assert_eq!(progress, json!({ "num_voters": 2, "num_voters_voted": 1 }));
    }
}
