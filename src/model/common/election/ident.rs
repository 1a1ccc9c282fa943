use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};

use crate::error::Error;

use super::{is_valid_ref, ElectionId, ElectionRef};

/// Either of the two ways an election can be addressed.
///
/// Refs are made of letters only, so an all-digit identifier is always an ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElectionIdent {
    ById(ElectionId),
    ByRef(ElectionRef),
}

impl ElectionIdent {
    /// Parse an identifier supplied by a client.
    pub fn parse(ident: &str) -> Result<Self, Error> {
        if !ident.is_empty() && ident.bytes().all(|b| b.is_ascii_digit()) {
            ident
                .parse::<ElectionId>()
                .map(Self::ById)
                .map_err(|_| Error::not_found(format!("Election {ident}")))
        } else if is_valid_ref(ident) {
            Ok(Self::ByRef(ident.to_string()))
        } else {
            Err(Error::not_found(format!("Election {ident}")))
        }
    }
}

impl From<ElectionId> for ElectionIdent {
    fn from(id: ElectionId) -> Self {
        Self::ById(id)
    }
}

impl From<&str> for ElectionIdent {
    fn from(election_ref: &str) -> Self {
        Self::ByRef(election_ref.to_string())
    }
}

impl FromStr for ElectionIdent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ElectionIdent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ById(id) => write!(f, "{id}"),
            Self::ByRef(election_ref) => write!(f, "{election_ref}"),
        }
    }
}

impl<'a> FromParam<'a> for ElectionIdent {
    type Error = Error;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        Self::parse(param)
    }
}

impl UriDisplay<Path> for ElectionIdent {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(self.to_string())
    }
}

impl_from_uri_param_identity!([Path] ElectionIdent);
