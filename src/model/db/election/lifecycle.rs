//! Rules deciding whether an election takes votes and shows its results.
//!
//! Every rule takes the current time as an argument rather than reading the clock.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

use super::{Election, ElectionCore};

impl ElectionCore {
    /// Has the election started?
    pub fn is_started(&self, now: DateTime<Utc>) -> bool {
        self.date_start.map_or(true, |start| now >= start)
    }

    /// Has the election ended, either by date or by force?
    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.force_close || self.date_end.map_or(false, |end| now > end)
    }

    /// Can ballots be cast or updated right now?
    pub fn can_accept_votes(&self, now: DateTime<Utc>) -> bool {
        self.is_started(now) && !self.is_ended(now)
    }

    /// Can ballots be created directly, without an invitation?
    pub fn accepts_direct_ballots(&self) -> bool {
        !self.restricted
    }
}

impl Election {
    /// Fail unless ballots can be cast or updated right now.
    pub fn check_accepts_votes(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_started(now) {
            return Err(Error::ElectionNotStarted(self.election_ref.clone()));
        }
        if self.is_ended(now) {
            return Err(Error::ElectionFinished(self.election_ref.clone()));
        }
        Ok(())
    }

    /// Fail if ballots can only be cast through invitations.
    pub fn check_accepts_direct_ballots(&self) -> Result<()> {
        if self.accepts_direct_ballots() {
            Ok(())
        } else {
            Err(Error::ElectionRestricted(self.election_ref.clone()))
        }
    }

    /// Fail unless the results may be shown.
    ///
    /// `token_scope` is the election ref carried by the caller's verified token, if any.
    pub fn check_results_visible(
        &self,
        now: DateTime<Utc>,
        token_scope: Option<&str>,
    ) -> Result<()> {
        if self.auth_for_result {
            match token_scope {
                Some(scope) if scope == self.election_ref => {}
                Some(_) => {
                    return Err(Error::Unauthorized(format!(
                        "Token is not valid for election {}",
                        self.election_ref
                    )))
                }
                None => {
                    return Err(Error::Unauthorized(format!(
                        "Results of election {} require a token",
                        self.election_ref
                    )))
                }
            }
        }
        if self.hide_results && !self.is_ended(now) {
            return Err(Error::ResultsHidden(self.election_ref.clone()));
        }
        Ok(())
    }
}
