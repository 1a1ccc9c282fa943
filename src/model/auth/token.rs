use jsonwebtoken::{
    errors::{Error as JwtError, ErrorKind as JwtErrorKind},
    Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::common::election::{ElectionRef, VoteId};

/// Grants access to one voter's votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallotClaims {
    /// Always sorted ascending.
    pub votes: Vec<VoteId>,
    pub election: ElectionRef,
}

/// Grants administration of one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminClaims {
    pub admin: bool,
    pub election: ElectionRef,
}

/// Grants named capabilities on one election, such as reading its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityClaims {
    pub iam: Vec<String>,
    pub election: ElectionRef,
}

/// Everything a token can carry. Each shape is told apart by its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenPayload {
    Ballot(BallotClaims),
    Admin(AdminClaims),
    Capability(CapabilityClaims),
}

impl TokenPayload {
    /// The election this token is scoped to.
    pub fn election(&self) -> &str {
        match self {
            Self::Ballot(claims) => &claims.election,
            Self::Admin(claims) => &claims.election,
            Self::Capability(claims) => &claims.election,
        }
    }

    /// Fail unless this is an admin token for the given election.
    pub fn require_admin(self, election_ref: &str) -> Result<AdminClaims> {
        match self {
            Self::Admin(claims) if claims.admin => {
                check_scope(&claims.election, election_ref)?;
                Ok(claims)
            }
            _ => Err(Error::Unauthorized(
                "An admin token is required".to_string(),
            )),
        }
    }

    /// Fail unless this is a ballot token.
    pub fn require_ballot(self) -> Result<BallotClaims> {
        match self {
            Self::Ballot(claims) => Ok(claims),
            _ => Err(Error::Unauthorized("A ballot token is required".to_string())),
        }
    }
}

/// Fail unless a token scoped to `token_election` may act on `requested`.
pub fn check_scope(token_election: &str, requested: &str) -> Result<()> {
    if token_election == requested {
        Ok(())
    } else {
        Err(Error::WrongElection {
            token: token_election.to_string(),
            requested: requested.to_string(),
        })
    }
}

/// Signs and verifies tokens with a shared HS256 secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens live as long as their election, so there are no registered claims to check.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a payload. Ballot vote IDs are sorted first.
    pub fn issue(&self, payload: TokenPayload) -> Result<String> {
        let payload = match payload {
            TokenPayload::Ballot(mut claims) => {
                claims.votes.sort_unstable();
                claims.votes.dedup();
                TokenPayload::Ballot(claims)
            }
            other => other,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| Error::InconsistentState(format!("Failed to sign token: {e}")))
    }

    /// Sign a ballot token for the given votes.
    pub fn issue_ballot(
        &self,
        election_ref: &str,
        votes: impl IntoIterator<Item = VoteId>,
    ) -> Result<String> {
        self.issue(TokenPayload::Ballot(BallotClaims {
            votes: votes.into_iter().collect(),
            election: election_ref.to_string(),
        }))
    }

    /// Sign an admin token for the given election.
    pub fn issue_admin(&self, election_ref: &str) -> Result<String> {
        self.issue(TokenPayload::Admin(AdminClaims {
            admin: true,
            election: election_ref.to_string(),
        }))
    }

    /// Check a token's signature and decode its payload.
    ///
    /// A token that is not validly signed is unauthorized; a signed token whose payload has
    /// none of the known shapes is a bad request.
    pub fn verify(&self, token: &str) -> Result<TokenPayload> {
        // The header is parsed before the signature is checked, so its errors say nothing
        // about the payload.
        jsonwebtoken::decode_header(token)
            .map_err(|e| Error::Unauthorized(format!("Invalid token header: {e}")))?;
        jsonwebtoken::decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(verification_error)
    }
}

fn verification_error(err: JwtError) -> Error {
    match err.kind() {
        JwtErrorKind::Json(_) | JwtErrorKind::Utf8(_) => {
            Error::BadRequest(format!("Malformed token payload: {err}"))
        }
        _ => Error::Unauthorized(format!("Invalid token: {err}")),
    }
}
