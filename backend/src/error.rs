use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorBody;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Station not found")]
    StationNotFound,

    #[error("Station already submitted")]
    AlreadySubmitted,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Votes exceed max voters")]
    CapacityExceeded,

    #[error("Unknown candidate")]
    UnknownCandidate,

    #[error("Invalid vote count")]
    InvalidCount,

    #[error("DB error")]
    Storage(#[from] diesel::result::Error),
}

impl TallyError {
    pub fn status(&self) -> Status {
        match self {
            TallyError::Storage(_) => Status::InternalServerError,
            _ => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for TallyError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        if let TallyError::Storage(e) = &self {
            error!("Storage failure on {}: {e}", request.uri());
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (self.status(), Json(body)).respond_to(request)
    }
}

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed data: {0}")]
    Parse(#[from] rocket::figment::Error),

    #[error("Ward has no candidates")]
    NoCandidates,

    #[error("Duplicate candidate code {0:?}")]
    DuplicateCandidate(String),

    #[error("Ward has no stations")]
    NoStations,

    #[error("Duplicate station {0:?}")]
    DuplicateStation(String),

    #[error("Station {0:?} has a negative voter capacity")]
    NegativeCapacity(String),

    #[error("Failed to seed database: {0}")]
    Storage(#[from] diesel::result::Error),
}
