//! Vote tally backend for a single electoral ward.
//!
//! Each polling station logs in with its shared password, confirms a count per
//! candidate (each confirm overwrites the last), and submits once. Submission
//! is refused while the station's counts exceed its registered voters, and a
//! submitted station is locked. `/api/totals` sums every station's counts.

#[macro_use]
extern crate rocket;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod seed;
pub mod tally;

use std::sync::Arc;

use rocket::fairing::AdHoc;
use rocket::fs::{FileServer, Options};
use rocket::{Build, Rocket};

use auth::StationAuthenticator;
use config::AppConfig;
use db::TallyDb;
use seed::Ward;

pub struct AppState {
    pub ward: Arc<Ward>,
    pub authenticator: Arc<dyn StationAuthenticator>,
}

pub fn build(config: AppConfig, ward: Ward) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge((
            "databases.tally_db",
            rocket_sync_db_pools::Config {
                url: config.database_url.clone(),
                pool_size: 16,
                timeout: 5,
            },
        ));

    let state = AppState {
        ward: Arc::new(ward),
        authenticator: config.password_scheme.authenticator(),
    };

    rocket::custom(figment)
        .manage(state)
        .attach(TallyDb::fairing())
        .attach(AdHoc::try_on_ignite("Database Migrations", db::run_migrations))
        .attach(AdHoc::try_on_ignite("Ward Seed", db::run_seeding))
        .attach(routes::cors())
        .mount(
            "/api",
            routes![
                routes::station::login,
                routes::station::confirm,
                routes::station::submit,
                routes::station::summary,
                routes::totals::totals,
            ],
        )
        .mount("/", routes![routes::preflight])
        .mount(
            "/",
            FileServer::new(&config.static_dir, Options::Index | Options::Missing),
        )
        .register("/api", catchers![routes::api_error])
}
