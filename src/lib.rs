#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod majority_judgment;
pub mod model;
pub mod service;
pub mod store;

use config::{Config, ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;
use model::auth::TokenService;
use store::StoreHandle;

/// Build the server. Config is loaded and MongoDB connected to when it ignites.
pub fn build() -> Rocket<Build> {
    mount(rocket::build())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
}

/// Build the server over an existing store, skipping the config and database fairings.
pub fn rocket_for_store(store: StoreHandle, config: Config) -> Rocket<Build> {
    let tokens = TokenService::new(config.jwt_secret());
    mount(rocket::build())
        .manage(config)
        .manage(tokens)
        .manage(store)
}

fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
}
