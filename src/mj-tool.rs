//! Offline helper for majority judgment elections.
//!
//! `admin-token` mints an admin token with the server's configured secret. `verify` re-ranks
//! the candidates of a results dump from its merit profiles and checks the claimed ranking.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;
use serde::Deserialize;

use mj_backend::{
    config::Config,
    majority_judgment::{rank, MeritProfile, RankingError},
    model::{auth::TokenService, common::election::CandidateId},
};

const PROGRAM_NAME: &str = "mj-tool";

const ABOUT_TEXT: &str = "Offline tools for majority judgment elections.

EXIT CODES:
     0: Success.
   255: Ran successfully, but verification failed.
 Other: Error.";

const ELECTION_REF: &str = "ELECTION_REF";
const RESULTS_PATH: &str = "RESULTS_PATH";

const RESULTS_PATH_HELP: &str = "The path to a JSON dump of an election's results,\n\
as returned by `GET /results/<election>`";

fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(
            Command::new("admin-token")
                .about("Mint an admin token using the secret from Rocket.toml or ROCKET_JWT_SECRET")
                .arg(
                    Arg::new(ELECTION_REF)
                        .help("The ref of the election to administer")
                        .action(ArgAction::Set)
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Check the ranking in a results dump against its merit profiles")
                .arg(
                    Arg::new(RESULTS_PATH)
                        .help(RESULTS_PATH_HELP)
                        .action(ArgAction::Set)
                        .required(true),
                ),
        )
}

/// Errors that this program may produce.
#[derive(Debug, PartialEq, Eq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the input or configuration.
    Format(String),
    /// The dump does not hold a consistent set of candidates.
    Candidates(String),
    /// The claimed ranking differs from the recomputed one.
    Mismatch {
        claimed: Vec<CandidateId>,
        computed: Vec<CandidateId>,
    },
}

#[derive(Debug, Deserialize)]
struct CandidateEntry {
    id: CandidateId,
    name: String,
}

/// The parts of a results dump needed to re-rank it.
#[derive(Debug, Deserialize)]
struct ResultsDump {
    candidates: Vec<CandidateEntry>,
    ranking: BTreeMap<CandidateId, usize>,
    merit_profile: BTreeMap<CandidateId, MeritProfile>,
}

impl ResultsDump {
    /// Candidate IDs ordered by their claimed rank.
    fn claimed_order(&self) -> Vec<CandidateId> {
        let mut claimed: Vec<_> = self.ranking.iter().map(|(&id, &rank)| (rank, id)).collect();
        claimed.sort_unstable();
        claimed.into_iter().map(|(_, id)| id).collect()
    }

    /// Candidate IDs ordered by their recomputed rank. Ties keep the election's candidate order.
    fn computed_order(&self) -> Result<Vec<CandidateId>, Error> {
        let mut profiles = Vec::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            let profile = self.merit_profile.get(&candidate.id).ok_or_else(|| {
                Error::Candidates(format!("No merit profile for candidate {}", candidate.id))
            })?;
            profiles.push((candidate.id, profile.clone()));
        }
        if profiles.len() != self.merit_profile.len() {
            return Err(Error::Candidates(
                "Merit profiles do not match the candidates".to_string(),
            ));
        }
        rank(profiles).map_err(|e| match e {
            RankingError::NoRecordedVotes => Error::Candidates(e.to_string()),
            RankingError::EmptyProfile(position) => Error::Candidates(format!(
                "Candidate {} has no votes",
                self.candidates[position].id
            )),
        })
    }

    fn name_of(&self, id: CandidateId) -> &str {
        self.candidates
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or("?")
    }
}

fn load(path: &str) -> Result<ResultsDump, Error> {
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(e.to_string()))?);
    serde_json::from_reader(file).map_err(|e| Error::Format(e.to_string()))
}

fn verify(dump: &ResultsDump) -> Result<Vec<CandidateId>, Error> {
    let claimed = dump.claimed_order();
    let computed = dump.computed_order()?;
    if claimed == computed {
        Ok(computed)
    } else {
        Err(Error::Mismatch { claimed, computed })
    }
}

fn admin_token(election_ref: &str) -> Result<String, Error> {
    let config: Config = rocket::Config::figment()
        .extract()
        .map_err(|e| Error::Format(e.to_string()))?;
    TokenService::new(config.jwt_secret())
        .issue_admin(election_ref)
        .map_err(|e| Error::Format(e.to_string()))
}

fn report(err: Error, dump: Option<&ResultsDump>) -> u8 {
    match err {
        Error::IO(msg) => {
            println!("IO error: {msg}");
            1
        }
        Error::Format(msg) => {
            println!("Invalid input: {msg}");
            1
        }
        Error::Candidates(msg) => {
            println!("Verification failed: {msg}");
            255
        }
        Error::Mismatch { claimed, computed } => {
            println!("Verification failed: the claimed ranking is wrong.");
            if let Some(dump) = dump {
                for (position, (claimed, computed)) in claimed.iter().zip(&computed).enumerate() {
                    println!(
                        "{:>3}. claimed {}, expected {}",
                        position + 1,
                        dump.name_of(*claimed),
                        dump.name_of(*computed)
                    );
                }
            }
            255
        }
    }
}

fn run(args: &ArgMatches) -> u8 {
    match args.subcommand() {
        Some(("admin-token", sub)) => {
            let Some(election_ref) = sub.get_one::<String>(ELECTION_REF) else {
                return 2;
            };
            match admin_token(election_ref) {
                Ok(token) => {
                    println!("{token}");
                    0
                }
                Err(err) => report(err, None),
            }
        }
        Some(("verify", sub)) => {
            let Some(path) = sub.get_one::<String>(RESULTS_PATH) else {
                return 2;
            };
            let dump = match load(path) {
                Ok(dump) => dump,
                Err(err) => return report(err, None),
            };
            match verify(&dump) {
                Ok(order) => {
                    println!("Verification succeeded.");
                    for (position, id) in order.into_iter().enumerate() {
                        println!("{:>3}. {}", position + 1, dump.name_of(id));
                    }
                    0
                }
                Err(err) => report(err, Some(&dump)),
            }
        }
        _ => 2,
    }
}

fn main() -> ExitCode {
    ExitCode::from(run(&cli().get_matches()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(ranking: &[(CandidateId, usize)]) -> ResultsDump {
        let ranking: BTreeMap<_, _> = ranking
            .iter()
            .map(|(id, rank)| (id.to_string(), rank))
            .collect();
        serde_json::from_value(serde_json::json!({
            "name": "Best pizza topping",
            "candidates": [
                { "id": 1, "name": "A" },
                { "id": 2, "name": "B" },
            ],
            "ranking": ranking,
            "merit_profile": {
                "1": { "0": 1, "1": 1 },
                "2": { "0": 2, "1": 0 },
            },
        }))
        .unwrap()
    }

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn correct_ranking_verifies() {
        assert_eq!(verify(&dump(&[(1, 1), (2, 2)])), Ok(vec![1, 2]));
    }

    #[test]
    fn wrong_ranking_fails() {
        assert_eq!(
            verify(&dump(&[(1, 2), (2, 1)])),
            Err(Error::Mismatch {
                claimed: vec![2, 1],
                computed: vec![1, 2],
            })
        );
    }

    #[test]
    fn missing_profile_fails() {
        let mut dump = dump(&[(1, 1), (2, 2)]);
        dump.merit_profile.remove(&2);
        assert!(matches!(verify(&dump), Err(Error::Candidates(_))));
    }
}
