use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const SLOT: &str = "10:00";

struct Settings {
    base_url: String,
    admin_token: String,
    requests_per_round: u32,
    rounds: u32,
    rps: u32,
}

impl Settings {
    fn from_env() -> Self {
        let number = |key: &str, default: u32| {
            env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        };
        Self {
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_token: env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set to seed availability"),
            requests_per_round: number("CONTENTION_REQUESTS", 50),
            rounds: number("CONTENTION_ROUNDS", 4),
            rps: number("CONTENTION_RPS", 500),
        }
    }
}

struct Outcome {
    latency: Duration,
    status: Option<StatusCode>,
}

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    println!("{}", "Slot contention probe".bold().green());
    println!("Target URL: {}", settings.base_url);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let backend = match client.get(format!("{}/api/v1/backend", settings.base_url)).send().await {
        Ok(res) => res.json::<Value>().await.unwrap_or_default(),
        Err(_) => {
            eprintln!("{}", format!("Server is NOT reachable at {}. Please start it first.", settings.base_url).red().bold());
            return;
        }
    };
    println!("Backend: {} (hold policy {})", backend["mode"], backend["slotHoldPolicy"]);
    if backend["readOnly"].as_bool() == Some(true) {
        eprintln!("{}", "Backend is read-only, nothing to contend for.".red().bold());
        return;
    }

    println!("\n{:<12} | {:<9} | {:<9} | {:<9} | {:<10} | {:<10}", "Date", "Created", "Rejected", "Errors", "Mean (ms)", "P99 (ms)");
    println!("{:-<12}-+-{:-<9}-+-{:-<9}-+-{:-<9}-+-{:-<10}-+-{:-<10}", "", "", "", "", "", "");

    let mut clean_rounds = 0;
    for round in 0..settings.rounds {
        // Far enough out to stay clear of real bookings.
        let date = (Utc::now() + ChronoDuration::days(3650 + i64::from(round))).format("%Y-%m-%d").to_string();
        seed_slot(&client, &settings, &date).await;
        if run_round(&client, &settings, &date).await {
            clean_rounds += 1;
        }
    }

    println!();
    if clean_rounds == settings.rounds {
        println!("{}", format!("All {} rounds produced exactly one booking per slot.", settings.rounds).green().bold());
    } else {
        println!("{}", format!("{} of {} rounds did NOT produce exactly one booking.", settings.rounds - clean_rounds, settings.rounds).red().bold());
    }
}

async fn seed_slot(client: &Client, settings: &Settings, date: &str) {
    let res = client.put(format!("{}/api/v1/availability/{}", settings.base_url, date))
        .bearer_auth(&settings.admin_token)
        .json(&json!({ "onlineSlots": [SLOT] }))
        .send()
        .await
        .expect("Failed to seed availability");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Failed to seed availability. Status: {}. Body: {}", status, txt);
    }
}

async fn run_round(client: &Client, settings: &Settings, date: &str) -> bool {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(settings.rps.max(1)).unwrap())
    ));

    let (tx, mut rx) = mpsc::channel(settings.requests_per_round as usize);
    let mut sent = 0;

    while sent < settings.requests_per_round {
        if limiter.check().is_err() {
            tokio::task::yield_now().await;
            continue;
        }
        sent += 1;

        let client = client.clone();
        let url = format!("{}/api/v1/bookings", settings.base_url);
        let body = json!({
            "name": format!("Probe {}", sent),
            "email": format!("probe-{}@example.com", Uuid::new_v4()),
            "date": date,
            "slot": SLOT,
        });
        let tx = tx.clone();

        tokio::spawn(async move {
            let req_start = Instant::now();
            let res = client.post(&url).json(&body).send().await;
            let _ = tx.send(Outcome {
                latency: req_start.elapsed(),
                status: res.ok().map(|r| r.status()),
            }).await;
        });
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).unwrap();
    let (mut created, mut rejected, mut errors) = (0, 0, 0);

    while let Some(outcome) = rx.recv().await {
        histogram.record(outcome.latency.as_micros() as u64).unwrap();
        match outcome.status {
            Some(StatusCode::CREATED) => created += 1,
            Some(StatusCode::CONFLICT) => rejected += 1,
            _ => errors += 1,
        }
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let created_cell = if created == 1 { created.to_string().green() } else { created.to_string().red().bold() };

    println!(
        "{:<12} | {:<9} | {:<9} | {:<9} | {:<10.2} | {:<10.2}",
        date, created_cell, rejected, errors, mean_ms, p99_ms
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
    created == 1
}
