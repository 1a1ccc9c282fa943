use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};

use crate::error::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// The raw token from an `Authorization: Bearer <token>` header.
///
/// The token is only checked for presence here; the services verify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    fn parse(header: &str) -> Option<Self> {
        header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.headers().get_one("Authorization") {
            Some(header) => match Self::parse(header) {
                Some(token) => Outcome::Success(token),
                None => Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Malformed Authorization header".to_string()),
                )),
            },
            None => Outcome::Failure((
                Status::Unauthorized,
                Error::Unauthorized("Missing bearer token".to_string()),
            )),
        }
    }
}
