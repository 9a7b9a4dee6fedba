use std::collections::BTreeMap;

use rocket::futures::future::join_all;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use rocket::serde::json::{json, Value};
use tempfile::TempDir;

use sigor_tally::auth::PasswordScheme;
use sigor_tally::config::AppConfig;
use sigor_tally::models::{Ack, ErrorBody, StationSummary};
use sigor_tally::seed::Ward;

fn config_in(dir: &TempDir) -> AppConfig {
    AppConfig {
        database_url: dir.path().join("votes.db").to_string_lossy().into_owned(),
        port: 3000,
        static_dir: dir.path().join("public").to_string_lossy().into_owned(),
        seed_file: None,
        password_scheme: PasswordScheme::Plaintext,
    }
}

async fn client_for(config: AppConfig) -> Client {
    let ward = config.ward().unwrap();
    Client::tracked(sigor_tally::build(config, ward))
        .await
        .expect("valid rocket instance")
}

async fn setup() -> (Client, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(config_in(&dir)).await;
    (client, dir)
}

async fn post<'a>(client: &'a Client, uri: &'static str, body: Value) -> LocalResponse<'a> {
    client.post(uri).json(&body).dispatch().await
}

async fn expect_ok(response: LocalResponse<'_>) {
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_json::<Ack>().await, Some(Ack { ok: true }));
}

async fn expect_error(response: LocalResponse<'_>, status: Status, message: &str) {
    assert_eq!(response.status(), status);
    let body = response.into_json::<ErrorBody>().await.unwrap();
    assert_eq!(body.error, message);
}

async fn confirm(client: &Client, station: &str, candidate: &str, count: i64) {
    let body = json!({ "station": station, "candidate": candidate, "count": count });
    expect_ok(post(client, "/api/confirm", body).await).await;
}

async fn summary(client: &Client, station: &str) -> StationSummary {
    client
        .get(format!("/api/stations/{station}"))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap()
}

async fn totals(client: &Client) -> BTreeMap<String, i64> {
    let response = client.get("/api/totals").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.unwrap()
}

#[rocket::async_test]
async fn login_succeeds_with_correct_password() {
    let (client, _dir) = setup().await;

    let response = post(&client, "/api/login", json!({ "name": "Tumoi", "password": "c3t" })).await;
    expect_ok(response).await;
}

#[rocket::async_test]
async fn login_errors() {
    let (client, _dir) = setup().await;

    let response = post(&client, "/api/login", json!({ "name": "Tumoi", "password": "nope" })).await;
    expect_error(response, Status::BadRequest, "Wrong password").await;

    let response = post(&client, "/api/login", json!({ "name": "Atlantis", "password": "c3t" })).await;
    expect_error(response, Status::BadRequest, "Station not found").await;
}

#[rocket::async_test]
async fn submit_within_capacity_locks_station() {
    let (client, _dir) = setup().await;

    confirm(&client, "Tumoi", "A", 300).await;
    confirm(&client, "Tumoi", "B", 200).await;
    confirm(&client, "Tumoi", "C", 100).await;

    expect_ok(post(&client, "/api/submit", json!({ "station": "Tumoi" })).await).await;
    assert!(summary(&client, "Tumoi").await.submitted);

    let response = post(&client, "/api/login", json!({ "name": "Tumoi", "password": "c3t" })).await;
    expect_error(response, Status::BadRequest, "Station already submitted").await;

    let response = post(&client, "/api/submit", json!({ "station": "Tumoi" })).await;
    expect_error(response, Status::BadRequest, "Station already submitted").await;

    let body = json!({ "station": "Tumoi", "candidate": "A", "count": 1 });
    let response = post(&client, "/api/confirm", body).await;
    expect_error(response, Status::BadRequest, "Station already submitted").await;
    assert_eq!(summary(&client, "Tumoi").await.votes["A"], 300);
}

#[rocket::async_test]
async fn submit_over_capacity_is_rejected() {
    let (client, _dir) = setup().await;

    confirm(&client, "Tumoi", "A", 300).await;
    confirm(&client, "Tumoi", "B", 300).await;
    confirm(&client, "Tumoi", "C", 100).await;

    let response = post(&client, "/api/submit", json!({ "station": "Tumoi" })).await;
    expect_error(response, Status::BadRequest, "Votes exceed max voters").await;

    let station = summary(&client, "Tumoi").await;
    assert!(!station.submitted);
    assert_eq!(station.max_voters, 614);

    let response = post(&client, "/api/login", json!({ "name": "Tumoi", "password": "c3t" })).await;
    expect_ok(response).await;
}

#[rocket::async_test]
async fn submit_unknown_station_is_rejected() {
    let (client, _dir) = setup().await;

    let response = post(&client, "/api/submit", json!({ "station": "Atlantis" })).await;
    expect_error(response, Status::BadRequest, "Station not found").await;
}

#[rocket::async_test]
async fn confirm_overwrites_and_validates() {
    let (client, _dir) = setup().await;

    confirm(&client, "Kosia", "D", 50).await;
    confirm(&client, "Kosia", "D", 20).await;
    assert_eq!(summary(&client, "Kosia").await.votes["D"], 20);

    let cases = [
        (json!({ "station": "Kosia", "candidate": "D", "count": -5 }), "Invalid vote count"),
        (json!({ "station": "Kosia", "candidate": "Q", "count": 5 }), "Unknown candidate"),
        (json!({ "station": "Atlantis", "candidate": "D", "count": 5 }), "Station not found"),
    ];

    for (body, message) in cases {
        expect_error(post(&client, "/api/confirm", body).await, Status::BadRequest, message).await;
    }

    assert_eq!(summary(&client, "Kosia").await.votes["D"], 20);
}

#[rocket::async_test]
async fn totals_after_single_confirm() {
    let (client, _dir) = setup().await;

    confirm(&client, "Tumoi", "A", 300).await;

    let expected: BTreeMap<String, i64> = [("A", 300), ("B", 0), ("C", 0), ("D", 0), ("S", 0)]
        .into_iter()
        .map(|(candidate, total)| (candidate.to_string(), total))
        .collect();
    assert_eq!(totals(&client).await, expected);
}

#[rocket::async_test]
async fn totals_span_submitted_and_open_stations() {
    let (client, _dir) = setup().await;

    confirm(&client, "Tumoi", "A", 300).await;
    confirm(&client, "Tumoi", "S", 14).await;
    expect_ok(post(&client, "/api/submit", json!({ "station": "Tumoi" })).await).await;
    confirm(&client, "Chebaraa", "A", 120).await;
    confirm(&client, "Chebaraa", "B", 9).await;

    let totals = totals(&client).await;
    assert_eq!(totals["A"], 420);
    assert_eq!(totals["B"], 9);
    assert_eq!(totals["S"], 14);
}

#[rocket::async_test]
async fn concurrent_confirms_across_stations_all_land() {
    let (client, _dir) = setup().await;
    let ward = Ward::embedded().unwrap();

    let requests = ward.stations.iter().map(|station| {
        let body = json!({ "station": station.name, "candidate": "C", "count": 7 });
        client.post("/api/confirm").json(&body).dispatch()
    });

    for response in join_all(requests).await {
        assert_eq!(response.status(), Status::Ok);
    }

    assert_eq!(totals(&client).await["C"], 7 * ward.stations.len() as i64);
}

#[rocket::async_test]
async fn submit_racing_confirms_never_locks_over_capacity() {
    for _ in 0..5 {
        let (client, _dir) = setup().await;
        confirm(&client, "Tumoi", "A", 600).await;

        let requests = (0..20).map(|i| {
            let (uri, body) = if i == 10 {
                ("/api/submit", json!({ "station": "Tumoi" }))
            } else {
                let count = if i % 2 == 0 { 100 } else { 0 };
                ("/api/confirm", json!({ "station": "Tumoi", "candidate": "B", "count": count }))
            };
            client.post(uri).json(&body).dispatch()
        });

        for response in join_all(requests).await {
            match response.status() {
                s if s == Status::Ok => {}
                s if s == Status::BadRequest => {
                    let body = response.into_json::<ErrorBody>().await.unwrap();
                    assert!(
                        body.error == "Station already submitted"
                            || body.error == "Votes exceed max voters",
                        "unexpected rejection: {}",
                        body.error
                    );
                }
                status => panic!("unexpected status {status}"),
            }
        }

        let station = summary(&client, "Tumoi").await;
        let sum: i32 = station.votes.values().sum();
        if station.submitted {
            assert!(sum <= station.max_voters, "submitted with {sum} votes");
            assert_eq!(station.votes["B"], 0);
        }
    }
}

#[rocket::async_test]
async fn concurrent_confirms_on_one_row_keep_a_written_value() {
    let (client, _dir) = setup().await;

    let requests = (1..=64).map(|count| {
        let body = json!({ "station": "Kabolwo1", "candidate": "S", "count": count });
        client.post("/api/confirm").json(&body).dispatch()
    });

    for response in join_all(requests).await {
        assert_eq!(response.status(), Status::Ok);
    }

    let count = summary(&client, "Kabolwo1").await.votes["S"];
    assert!((1..=64).contains(&count));
    assert_eq!(totals(&client).await["S"], i64::from(count));
}

#[rocket::async_test]
async fn malformed_payloads_get_json_errors() {
    let (client, _dir) = setup().await;

    let response = post(&client, "/api/confirm", json!({ "station": "Tumoi", "candidate": "A" })).await;
    expect_error(response, Status::UnprocessableEntity, "Malformed payload").await;

    let response = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    expect_error(response, Status::BadRequest, "Malformed payload").await;

    let response = client.get("/api/nothing-here").dispatch().await;
    expect_error(response, Status::NotFound, "Not found").await;
}

#[rocket::async_test]
async fn responses_carry_cors_headers() {
    let (client, _dir) = setup().await;

    let response = client.get("/api/totals").dispatch().await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let response = client.options("/api/confirm").dispatch().await;
    assert_eq!(response.status(), Status::NoContent);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Methods"),
        Some("GET, POST, OPTIONS")
    );
}

#[rocket::async_test]
async fn restart_keeps_counts_and_submission() {
    let dir = tempfile::tempdir().unwrap();

    let client = client_for(config_in(&dir)).await;
    confirm(&client, "Mismis", "B", 44).await;
    expect_ok(post(&client, "/api/submit", json!({ "station": "Mismis" })).await).await;
    drop(client);

    let client = client_for(config_in(&dir)).await;
    let station = summary(&client, "Mismis").await;
    assert!(station.submitted);
    assert_eq!(station.votes["B"], 44);

    let response = post(&client, "/api/login", json!({ "name": "Mismis", "password": "i9n" })).await;
    expect_error(response, Status::BadRequest, "Station already submitted").await;
}

#[rocket::async_test]
async fn bcrypt_scheme_with_custom_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let hash = bcrypt::hash("secret", 4).unwrap();
    let seed_path = dir.path().join("ward.toml");
    std::fs::write(
        &seed_path,
        format!(
            "name = \"Test Ward\"\ncandidates = [\"X\", \"Y\"]\n\n\
             [[stations]]\nname = \"Hall\"\npassword = \"{hash}\"\nmax_voters = 10\n"
        ),
    )
    .unwrap();

    let mut config = config_in(&dir);
    config.seed_file = Some(seed_path.to_string_lossy().into_owned());
    config.password_scheme = PasswordScheme::Bcrypt;
    let client = client_for(config).await;

    let response = post(&client, "/api/login", json!({ "name": "Hall", "password": "secret" })).await;
    expect_ok(response).await;

    let response = post(&client, "/api/login", json!({ "name": "Hall", "password": hash })).await;
    expect_error(response, Status::BadRequest, "Wrong password").await;

    confirm(&client, "Hall", "X", 6).await;
    confirm(&client, "Hall", "Y", 5).await;
    let response = post(&client, "/api/submit", json!({ "station": "Hall" })).await;
    expect_error(response, Status::BadRequest, "Votes exceed max voters").await;

    let expected: BTreeMap<String, i64> =
        [("X".to_string(), 6), ("Y".to_string(), 5)].into_iter().collect();
    assert_eq!(totals(&client).await, expected);
}
