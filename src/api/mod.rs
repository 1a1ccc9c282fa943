use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::ErrorBody;

mod ballots;
mod elections;
mod results;

pub fn routes() -> Vec<Route> {
    let mut routes = routes![liveness];
    routes.extend(elections::routes());
    routes.extend(ballots::routes());
    routes.extend(results::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

#[get("/liveness")]
fn liveness() -> &'static str {
    "OK"
}

/// Answer failed guards and unmatched routes with the same body as every other error.
#[catch(default)]
fn default_catcher(status: Status, req: &Request) -> (Status, Json<ErrorBody>) {
    (status, Json(ErrorBody::for_status(status, req.uri().path().as_str())))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client, serde::json::Value};

    use super::*;

    #[backend_test]
    async fn liveness_is_ok(client: Client) {
        let response = client.get(uri!(liveness)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(response.into_string().await.unwrap(), "OK");
    }

    #[backend_test]
    async fn unknown_routes_get_json_errors(client: Client) {
        let response = client.get("/nothing/here").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "not_found");
    }
}
