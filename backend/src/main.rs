// Main application entry point

use sigor_tally::config::AppConfig;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[rocket::launch]
fn rocket() -> _ {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::load().expect(
        "Failed to load configuration. Check Config.toml and the DATABASE_URL, ROCKET_PORT, STATIC_DIR, SEED_FILE and PASSWORD_SCHEME variables.",
    );
    let ward = config.ward().expect("Failed to load ward seed data");

    info!(
        "{} election backend: {} stations, {} candidates, database {}",
        ward.name,
        ward.stations.len(),
        ward.candidates.len(),
        config.database_url
    );

    sigor_tally::build(config, ward)
}
