use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sigor_tally::seed::{StationSeed, Ward};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target URL (e.g., http://localhost:3000)
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Number of stations driven at once
    #[arg(short, long, default_value_t = 8)]
    concurrency: usize,

    /// Ward seed file the server was started with (defaults to the built-in ward)
    #[arg(short, long)]
    seed_file: Option<String>,

    /// Share of stations that first try to submit more votes than their capacity
    #[arg(short, long, default_value_t = 0.25)]
    overflow_rate: f64,

    /// Drive only these stations (repeatable); all stations when omitted
    #[arg(long = "station")]
    stations: Vec<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    station: &'a str,
    candidate: &'a str,
    count: i64,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    station: &'a str,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: String,
}

/// Counts a station will end up with, plus whether it first overfills.
struct StationPlan {
    counts: Vec<(String, i64)>,
    overflow: bool,
}

fn plan_station(
    station: &StationSeed,
    candidates: &[String],
    overflow_rate: f64,
) -> StationPlan {
    let mut rng = rand::thread_rng();
    let mut remaining = i64::from(station.max_voters);

    let counts = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let share = remaining / (candidates.len() - i) as i64;
            let count = rng.gen_range(0..=share);
            remaining -= count;
            (candidate.clone(), count)
        })
        .collect();

    StationPlan {
        counts,
        overflow: rng.gen_bool(overflow_rate.clamp(0.0, 1.0)),
    }
}

async fn post<T: Serialize>(client: &Client, url: &str, body: &T) -> Result<()> {
    client
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {url}"))?
        .error_for_status()
        .with_context(|| format!("Request to {url} failed"))?;

    Ok(())
}

async fn confirm(
    client: &Client,
    base_url: &str,
    station: &str,
    candidate: &str,
    count: i64,
) -> Result<()> {
    let url = format!("{}/api/confirm", base_url);
    post(
        client,
        &url,
        &ConfirmRequest {
            station,
            candidate,
            count,
        },
    )
    .await
}

async fn expect_capacity_rejection(client: &Client, base_url: &str, station: &str) -> Result<()> {
    let url = format!("{}/api/submit", base_url);
    let response = client
        .post(&url)
        .json(&SubmitRequest { station })
        .send()
        .await
        .context("Failed to send overfilled submit")?;

    ensure!(
        response.status() == StatusCode::BAD_REQUEST,
        "Overfilled submit for {station} returned {}",
        response.status()
    );

    let body: ErrorBody = response.json().await.context("Failed to parse error body")?;
    ensure!(
        body.error == "Votes exceed max voters",
        "Overfilled submit for {station} failed with {:?}",
        body.error
    );

    Ok(())
}

async fn run_station(
    client: &Client,
    base_url: &str,
    station: &StationSeed,
    plan: &StationPlan,
) -> Result<()> {
    // 1. Login
    let login_url = format!("{}/api/login", base_url);
    post(
        client,
        &login_url,
        &LoginRequest {
            name: &station.name,
            password: &station.password,
        },
    )
    .await
    .context("Login failed")?;

    // 2. Optionally overfill and confirm the server refuses the submit
    if plan.overflow {
        if let Some((candidate, _)) = plan.counts.first() {
            let count = i64::from(station.max_voters) + 1;
            confirm(client, base_url, &station.name, candidate, count).await?;
            expect_capacity_rejection(client, base_url, &station.name).await?;
        }
    }

    // 3. Confirm the real counts
    for (candidate, count) in &plan.counts {
        confirm(client, base_url, &station.name, candidate, *count).await?;
    }

    // 4. Submit
    let submit_url = format!("{}/api/submit", base_url);
    post(client, &submit_url, &SubmitRequest { station: &station.name })
        .await
        .context("Submit failed")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let ward = match &args.seed_file {
        Some(path) => Ward::from_file(path),
        None => Ward::embedded(),
    }
    .context("Failed to load ward seed data")?;

    let stations: Vec<&StationSeed> = if args.stations.is_empty() {
        ward.stations.iter().collect()
    } else {
        args.stations
            .iter()
            .map(|name| {
                ward.station(name)
                    .with_context(|| format!("Station {name:?} is not in {}", ward.name))
            })
            .collect::<Result<_>>()?
    };

    println!("🚀 Starting load test against {}", args.url);
    println!(
        "🗳️  Ward: {} ({} of {} stations)",
        ward.name,
        stations.len(),
        ward.stations.len()
    );
    println!("⚡ Concurrency: {}", args.concurrency);

    let plans: Vec<StationPlan> = stations
        .iter()
        .map(|station| plan_station(station, &ward.candidates, args.overflow_rate))
        .collect();

    let mut expected: BTreeMap<String, i64> =
        ward.candidates.iter().map(|c| (c.clone(), 0)).collect();
    for plan in &plans {
        for (candidate, count) in &plan.counts {
            *expected.entry(candidate.clone()).or_default() += count;
        }
    }

    let client = Client::new();
    let success_count = Arc::new(AtomicUsize::new(0));
    let failure_count = Arc::new(AtomicUsize::new(0));

    let pb = ProgressBar::new(stations.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let start_time = Instant::now();

    stream::iter(stations.iter().copied().zip(&plans))
        .map(|(station, plan)| {
            let client = &client;
            let base_url = args.url.as_str();
            let success_count = success_count.clone();
            let failure_count = failure_count.clone();
            let pb = pb.clone();

            async move {
                match run_station(client, base_url, station, plan).await {
                    Ok(()) => {
                        success_count.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        failure_count.fetch_add(1, Ordering::Relaxed);
                        pb.println(format!("❌ {}: {:#}", station.name, e));
                    }
                }
                pb.set_message(format!(
                    "Submitted: {} Errors: {}",
                    success_count.load(Ordering::Relaxed),
                    failure_count.load(Ordering::Relaxed)
                ));
                pb.inc(1);
            }
        })
        .buffer_unordered(args.concurrency.max(1))
        .collect::<Vec<()>>()
        .await;

    pb.finish_with_message("Done");

    let duration = start_time.elapsed();
    let successes = success_count.load(Ordering::Relaxed);
    let failures = failure_count.load(Ordering::Relaxed);

    println!("\n📊 Results:");
    println!("   Time taken: {:?}", duration);
    println!("   Stations submitted: {}", successes);
    println!("   Stations failed: {}", failures);
    println!(
        "   Throughput: {:.2} stations/sec",
        successes as f64 / duration.as_secs_f64()
    );

    let totals_url = format!("{}/api/totals", args.url);
    let totals: BTreeMap<String, i64> = client
        .get(&totals_url)
        .send()
        .await
        .context("Failed to fetch totals")?
        .error_for_status()
        .context("Totals request failed")?
        .json()
        .await
        .context("Failed to parse totals")?;

    println!("\n🧮 Totals:");
    for (candidate, total) in &totals {
        let want = expected.get(candidate).copied().unwrap_or_default();
        let mark = if *total == want { "✅" } else { "❌" };
        println!("   {} {}: {} (expected {})", mark, candidate, total, want);
    }

    if failures > 0 {
        bail!("{} station(s) failed", failures);
    }
    if totals != expected {
        bail!("Totals do not match confirmed counts; was the database fresh?");
    }

    Ok(())
}
