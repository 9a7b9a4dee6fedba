// Station password verification

use std::sync::Arc;

use serde::Deserialize;

/// Checks a password supplied at login against the value stored for the station.
pub trait StationAuthenticator: Send + Sync {
    fn verify(&self, supplied: &str, stored: &str) -> bool;
}

/// Stored passwords are the shared secrets themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextAuthenticator;

impl StationAuthenticator for PlaintextAuthenticator {
    fn verify(&self, supplied: &str, stored: &str) -> bool {
        supplied == stored
    }
}

/// Stored passwords are bcrypt hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct BcryptAuthenticator;

impl StationAuthenticator for BcryptAuthenticator {
    fn verify(&self, supplied: &str, stored: &str) -> bool {
        bcrypt::verify(supplied, stored).unwrap_or(false)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    #[default]
    Plaintext,
    Bcrypt,
}

impl PasswordScheme {
    pub fn authenticator(self) -> Arc<dyn StationAuthenticator> {
        match self {
            PasswordScheme::Plaintext => Arc::new(PlaintextAuthenticator),
            PasswordScheme::Bcrypt => Arc::new(BcryptAuthenticator),
        }
    }
}
