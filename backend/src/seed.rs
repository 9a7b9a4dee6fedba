//! Ward seed data.
//!
//! The stations, their capacities and shared passwords, and the candidate codes are
//! loaded once at startup and written into the database with insert-or-ignore
//! semantics, so restarting the server never resets counts or submission state.

use std::collections::HashSet;
use std::path::Path;

use diesel::prelude::*;
use rocket::figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::error::SeedError;
use crate::models::{NewStation, NewVoteTally};
use crate::schema::{stations, votes};

const SIGOR_WARD: &str = include_str!("../seed/sigor_ward.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct StationSeed {
    pub name: String,
    pub password: String,
    pub max_voters: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ward {
    pub name: String,
    pub candidates: Vec<String>,
    pub stations: Vec<StationSeed>,
}

impl Ward {
    /// The compiled-in Sigor Ward table.
    pub fn embedded() -> Result<Self, SeedError> {
        Self::from_toml_str(SIGOR_WARD)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        Self::from_figment(Figment::from(Toml::file_exact(path.as_ref())))
    }

    pub fn from_toml_str(source: &str) -> Result<Self, SeedError> {
        Self::from_figment(Figment::from(Toml::string(source)))
    }

    fn from_figment(figment: Figment) -> Result<Self, SeedError> {
        let ward: Ward = figment.extract()?;
        ward.validate()?;
        Ok(ward)
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        if self.candidates.is_empty() {
            return Err(SeedError::NoCandidates);
        }

        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if !seen.insert(candidate.as_str()) {
                return Err(SeedError::DuplicateCandidate(candidate.clone()));
            }
        }

        if self.stations.is_empty() {
            return Err(SeedError::NoStations);
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.name.as_str()) {
                return Err(SeedError::DuplicateStation(station.name.clone()));
            }
            if station.max_voters < 0 {
                return Err(SeedError::NegativeCapacity(station.name.clone()));
            }
        }

        Ok(())
    }

    pub fn station(&self, name: &str) -> Option<&StationSeed> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// Inserts any missing station and tally rows, returning how many stations were new.
    pub fn apply(&self, conn: &mut SqliteConnection) -> Result<usize, SeedError> {
        let inserted = conn.transaction(|conn| {
            let mut inserted = 0;

            for station in &self.stations {
                inserted += diesel::insert_or_ignore_into(stations::table)
                    .values(&NewStation {
                        name: &station.name,
                        password: &station.password,
                        max_voters: station.max_voters,
                    })
                    .execute(conn)?;

                for candidate in &self.candidates {
                    diesel::insert_or_ignore_into(votes::table)
                        .values(&NewVoteTally {
                            station: &station.name,
                            candidate: candidate.as_str(),
                            count: 0,
                        })
                        .execute(conn)?;
                }
            }

            Ok::<_, diesel::result::Error>(inserted)
        })?;

        Ok(inserted)
    }
}
