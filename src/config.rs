use std::sync::Arc;

use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::auth::TokenService;
use crate::store::{MongoStore, StoreHandle};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and is passed
/// explicitly to every service call.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "defaults::max_candidates")]
    max_candidates: usize,
    #[serde(default = "defaults::max_grades")]
    max_grades: usize,
    #[serde(default = "defaults::max_voters")]
    max_voters: u32,
    #[serde(default = "defaults::ref_length")]
    ref_length: usize,
    #[serde(default = "defaults::ref_attempts")]
    ref_attempts: usize,
    // secrets
    jwt_secret: String,
}

mod defaults {
    pub fn max_candidates() -> usize {
        100
    }

    pub fn max_grades() -> usize {
        10
    }

    pub fn max_voters() -> u32 {
        1_000_000
    }

    pub fn ref_length() -> usize {
        10
    }

    pub fn ref_attempts() -> usize {
        10
    }
}

impl Config {
    /// Build a config with the given secret and default limits.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            max_candidates: defaults::max_candidates(),
            max_grades: defaults::max_grades(),
            max_voters: defaults::max_voters(),
            ref_length: defaults::ref_length(),
            ref_attempts: defaults::ref_attempts(),
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Most candidates an election may have.
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Most grades an election may have. Grade values are also below this.
    pub fn max_grades(&self) -> usize {
        self.max_grades
    }

    /// Most voters that can be invited to a restricted election.
    pub fn max_voters(&self) -> u32 {
        self.max_voters
    }

    /// Length of generated election refs.
    pub fn ref_length(&self) -> usize {
        self.ref_length
    }

    /// How many refs to try before giving up on creating an election.
    pub fn ref_attempts(&self) -> usize {
        self.ref_attempts
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it, and the token
/// service built from its secret, in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        let tokens = TokenService::new(config.jwt_secret());
        rocket = rocket.manage(config).manage(tokens);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // non-secrets
    #[serde(default = "default_db_name")]
    db_name: String,
    // secrets
    db_uri: String,
}

fn default_db_name() -> String {
    "majority_judgment".to_string()
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places a [`StoreHandle`] into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(&config.db_name);

        // Ensure the required indexes and counters exist.
        let store = match MongoStore::connect(client, db).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to set up database: {e}");
                return Err(rocket);
            }
        };
        info!("...database connection online!");

        // Manage the state.
        let store: StoreHandle = Arc::new(store);
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}
