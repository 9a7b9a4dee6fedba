use rocket::figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::auth::PasswordScheme;
use crate::error::SeedError;
use crate::seed::Ward;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_port", alias = "rocket_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// TOML file with the ward's stations; the compiled-in Sigor Ward table is used when unset.
    #[serde(default)]
    pub seed_file: Option<String>,
    #[serde(default)]
    pub password_scheme: PasswordScheme,
}

fn default_database_url() -> String {
    "votes.db".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

impl AppConfig {
    pub fn load() -> Result<Self, rocket::figment::Error> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("Config.toml"))
                .merge(Toml::file("../Config.toml"))
                .merge(Env::raw().only(&[
                    "DATABASE_URL",
                    "ROCKET_PORT",
                    "STATIC_DIR",
                    "SEED_FILE",
                    "PASSWORD_SCHEME",
                ])),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }

    pub fn ward(&self) -> Result<Ward, SeedError> {
        match &self.seed_file {
            Some(path) => Ward::from_file(path),
            None => Ward::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_figment(Figment::new()).unwrap();

        assert_eq!(config.database_url, "votes.db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.static_dir, "public");
        assert!(config.seed_file.is_none());
        assert_eq!(config.password_scheme, PasswordScheme::Plaintext);
    }

    #[test]
    fn rocket_port_key_sets_port() {
        let figment = Figment::new().merge(("rocket_port", 8123));
        assert_eq!(AppConfig::from_figment(figment).unwrap().port, 8123);
    }

    #[test]
    fn toml_overrides_defaults() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            database_url = "/var/lib/tally/votes.db"
            port = 8080
            password_scheme = "bcrypt"
            "#,
        ));
        let config = AppConfig::from_figment(figment).unwrap();

        assert_eq!(config.database_url, "/var/lib/tally/votes.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.password_scheme, PasswordScheme::Bcrypt);
    }
}
