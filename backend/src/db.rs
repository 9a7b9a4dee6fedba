// Database connection and initialization

use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rocket::fairing;
use rocket::{Build, Rocket};
use rocket_sync_db_pools::database;
use tracing::{error, info};

use crate::AppState;

/// Connection pool for the tally database
#[database("tally_db")]
pub struct TallyDb(SqliteConnection);

// Embed migrations from the migrations directory
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply pending migrations, returning the versions that ran
pub fn migrate(conn: &mut SqliteConnection) -> Result<Vec<String>, String> {
    let versions = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| format!("Failed to run migrations: {}", e))?
        .into_iter()
        .map(|v| v.to_string())
        .collect();

    Ok(versions)
}

/// Run pending database migrations
pub async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    let Some(db) = TallyDb::get_one(&rocket).await else {
        error!("No database connection available for migrations");
        return Err(rocket);
    };

    match db.run(migrate).await {
        Ok(versions) if versions.is_empty() => info!("Database is up to date"),
        Ok(versions) => {
            info!("Applied {} migration(s)", versions.len());
            for version in versions {
                info!("   - {}", version);
            }
        }
        Err(e) => {
            error!("Database migration failed: {}", e);
            return Err(rocket);
        }
    }

    Ok(rocket)
}

/// Seed database with the ward's stations and candidates
pub async fn run_seeding(rocket: Rocket<Build>) -> fairing::Result {
    let Some(ward) = rocket.state::<AppState>().map(|state| state.ward.clone()) else {
        error!("Application state is not managed, cannot seed");
        return Err(rocket);
    };

    let Some(db) = TallyDb::get_one(&rocket).await else {
        error!("No database connection available for seeding");
        return Err(rocket);
    };

    let ward_name = ward.name.clone();
    match db.run(move |conn| ward.apply(conn)).await {
        Ok(0) => info!("{} stations already seeded", ward_name),
        Ok(inserted) => info!("Seeded {} new station(s) for {}", inserted, ward_name),
        Err(e) => {
            error!("Seeding failed: {}", e);
            return Err(rocket);
        }
    }

    Ok(rocket)
}

#[cfg(test)]
pub(crate) fn memory_connection(ward: &crate::seed::Ward) -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    migrate(&mut conn).unwrap();
    ward.apply(&mut conn).unwrap();
    conn
}
