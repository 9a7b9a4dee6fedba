use rocket::serde::json::Json;
use rocket::State;
use tracing::{info, warn};

use crate::db::TallyDb;
use crate::error::TallyError;
use crate::models::{Ack, ConfirmRequest, LoginRequest, StationSummary, SubmitRequest};
use crate::tally;
use crate::AppState;

fn rejected<'a>(action: &'static str, station: &'a str) -> impl FnOnce(&TallyError) + 'a {
    move |e: &TallyError| warn!("Rejected {} for station {:?}: {}", action, station, e)
}

// Route to check a station's password
#[post("/login", format = "json", data = "<login_request>")]
pub async fn login(
    db: TallyDb,
    state: &State<AppState>,
    login_request: Json<LoginRequest>,
) -> Result<Json<Ack>, TallyError> {
    let LoginRequest { name, password } = login_request.into_inner();
    let authenticator = state.authenticator.clone();
    let station = name.clone();

    db.run(move |conn| tally::login(conn, authenticator.as_ref(), &name, &password))
        .await
        .inspect_err(rejected("login", &station))?;

    info!("Station {:?} logged in", station);
    Ok(Json(Ack::ok()))
}

// Route to overwrite one candidate's count at a station
#[post("/confirm", format = "json", data = "<confirm_request>")]
pub async fn confirm(
    db: TallyDb,
    confirm_request: Json<ConfirmRequest>,
) -> Result<Json<Ack>, TallyError> {
    let ConfirmRequest {
        station,
        candidate,
        count,
    } = confirm_request.into_inner();
    let (name, code) = (station.clone(), candidate.clone());

    db.run(move |conn| tally::confirm_vote(conn, &station, &candidate, count))
        .await
        .inspect_err(rejected("confirm", &name))?;

    info!("Station {:?} confirmed {} = {}", name, code, count);
    Ok(Json(Ack::ok()))
}

// Route to finalize a station
#[post("/submit", format = "json", data = "<submit_request>")]
pub async fn submit(
    db: TallyDb,
    submit_request: Json<SubmitRequest>,
) -> Result<Json<Ack>, TallyError> {
    let station = submit_request.into_inner().station;
    let name = station.clone();

    let total = db
        .run(move |conn| tally::submit_station(conn, &station))
        .await
        .inspect_err(rejected("submit", &name))?;

    info!("Station {:?} submitted with {} votes", name, total);
    Ok(Json(Ack::ok()))
}

// Route to view a station's current counts
#[get("/stations/<name>")]
pub async fn summary(db: TallyDb, name: String) -> Result<Json<StationSummary>, TallyError> {
    db.run(move |conn| tally::station_summary(conn, &name))
        .await
        .map(Json)
}
