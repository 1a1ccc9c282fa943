use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request, Response,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Invalid request: {0}")]
    Invalid(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Election {0} is restricted to invited voters")]
    ElectionRestricted(String),
    #[error("Election {0} has not started yet")]
    ElectionNotStarted(String),
    #[error("Election {0} is finished")]
    ElectionFinished(String),
    #[error("Inconsistent ballot: {0}")]
    InconsistentBallot(String),
    #[error("Immutable identifiers: {0}")]
    ImmutableIds(String),
    #[error("Election {0} is active, its start date can no longer change")]
    ElectionIsActive(String),
    #[error("Results of election {0} are hidden until it ends")]
    ResultsHidden(String),
    #[error("Token is scoped to election {token}, not {requested}")]
    WrongElection { token: String, requested: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("No votes were recorded for election {0}")]
    NoRecordedVotes(String),
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::Invalid(what.into())
    }

    /// Stable machine-readable code, independent of the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::Invalid(_) => "invalid_request",
            Self::Forbidden(_) => "forbidden",
            Self::ElectionRestricted(_) => "election_restricted",
            Self::ElectionNotStarted(_) => "election_not_started",
            Self::ElectionFinished(_) => "election_finished",
            Self::InconsistentBallot(_) => "inconsistent_ballot",
            Self::ImmutableIds(_) => "immutable_ids",
            Self::ElectionIsActive(_) => "election_is_active",
            Self::ResultsHidden(_) => "results_hidden",
            Self::WrongElection { .. } => "wrong_election",
            Self::Conflict(_) => "conflict",
            Self::NoRecordedVotes(_) => "no_recorded_votes",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::InconsistentState(_) => Status::InternalServerError,
            Self::NotFound(_) | Self::NoRecordedVotes(_) => Status::NotFound,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Invalid(_) => Status::UnprocessableEntity,
            Self::Conflict(_) => Status::Conflict,
            Self::Forbidden(_)
            | Self::ElectionRestricted(_)
            | Self::ElectionNotStarted(_)
            | Self::ElectionFinished(_)
            | Self::InconsistentBallot(_)
            | Self::ImmutableIds(_)
            | Self::ElectionIsActive(_)
            | Self::ResultsHidden(_)
            | Self::WrongElection { .. } => Status::Forbidden,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ErrorBody {
    /// Body for a response Rocket produced itself, such as an unmatched route or a failed guard.
    pub fn for_status(status: Status, path: &str) -> Self {
        let error = match status.code {
            400 => "bad_request",
            401 => "unauthorized",
            403 => "forbidden",
            404 => "not_found",
            413 => "payload_too_large",
            415 => "unsupported_media_type",
            422 => "invalid_request",
            code if code >= 500 => "internal_error",
            _ => "error",
        };
        Self {
            error,
            message: format!("{status} for {path}"),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.class() == StatusClass::ServerError {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
