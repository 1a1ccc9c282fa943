//! Election-scoped tokens.

mod bearer;
mod token;

pub use bearer::BearerToken;
pub use token::{
    check_scope, AdminClaims, BallotClaims, CapabilityClaims, TokenPayload, TokenService,
};
