//! Station tally operations.
//!
//! Every write goes through an immediate SQLite transaction, which takes the
//! database write lock up front. A confirm can therefore never land between
//! the capacity check and the `submitted` flag being set by a submit.

use diesel::dsl::sum;
use diesel::prelude::*;

use crate::auth::StationAuthenticator;
use crate::error::TallyError;
use crate::models::{Station, StationSummary, Totals, VoteTally};
use crate::schema::{stations, votes};

pub fn find_station(conn: &mut SqliteConnection, name: &str) -> Result<Station, TallyError> {
    stations::table
        .find(name)
        .select(Station::as_select())
        .first(conn)
        .optional()?
        .ok_or(TallyError::StationNotFound)
}

/// Checks a station's credentials. Nothing is written and no session is issued.
pub fn login(
    conn: &mut SqliteConnection,
    auth: &dyn StationAuthenticator,
    name: &str,
    password: &str,
) -> Result<(), TallyError> {
    let station = find_station(conn, name)?;

    if station.submitted {
        return Err(TallyError::AlreadySubmitted);
    }

    if !auth.verify(password, &station.password) {
        return Err(TallyError::WrongPassword);
    }

    Ok(())
}

/// Overwrites the count for one candidate at a station that has not yet submitted.
pub fn confirm_vote(
    conn: &mut SqliteConnection,
    station: &str,
    candidate: &str,
    count: i64,
) -> Result<(), TallyError> {
    let count = i32::try_from(count)
        .ok()
        .filter(|c| *c >= 0)
        .ok_or(TallyError::InvalidCount)?;

    conn.immediate_transaction(|conn| {
        if find_station(conn, station)?.submitted {
            return Err(TallyError::AlreadySubmitted);
        }

        let updated = diesel::update(votes::table.find((station, candidate)))
            .set(votes::count.eq(count))
            .execute(conn)?;

        // Seeding creates a row for every candidate, so no row means no such candidate.
        if updated == 0 {
            return Err(TallyError::UnknownCandidate);
        }

        Ok(())
    })
}

/// Finalizes a station if its confirmed counts fit within its capacity.
///
/// Returns the number of votes recorded for the station.
pub fn submit_station(conn: &mut SqliteConnection, station: &str) -> Result<i64, TallyError> {
    conn.immediate_transaction(|conn| {
        let record = find_station(conn, station)?;

        if record.submitted {
            return Err(TallyError::AlreadySubmitted);
        }

        let total = votes::table
            .filter(votes::station.eq(station))
            .select(sum(votes::count))
            .get_result::<Option<i64>>(conn)?
            .unwrap_or(0);

        if total > i64::from(record.max_voters) {
            return Err(TallyError::CapacityExceeded);
        }

        diesel::update(stations::table.find(station))
            .set(stations::submitted.eq(true))
            .execute(conn)?;

        Ok(total)
    })
}

/// Sums every station's counts per candidate, submitted or not.
pub fn totals(conn: &mut SqliteConnection) -> Result<Totals, TallyError> {
    let rows = votes::table
        .group_by(votes::candidate)
        .select((votes::candidate, sum(votes::count)))
        .load::<(String, Option<i64>)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(candidate, total)| (candidate, total.unwrap_or(0)))
        .collect())
}

pub fn station_summary(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<StationSummary, TallyError> {
    let station = find_station(conn, name)?;

    let tallies = votes::table
        .filter(votes::station.eq(name))
        .select(VoteTally::as_select())
        .load(conn)?;

    Ok(StationSummary {
        name: station.name,
        max_voters: station.max_voters,
        submitted: station.submitted,
        votes: tallies
            .into_iter()
            .map(|tally| (tally.candidate, tally.count))
            .collect(),
    })
}
