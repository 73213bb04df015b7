//! Sensor Readings CLI
//!
//! Command-line client for the sensor readings API:
//! - Log a reading
//! - List a device's readings
//! - Compute a statistic
//! - Generate a default config file

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sensor_readings::query::Statistic;
use sensor_readings::storage::SensorType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sensor-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client for the sensor readings API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:5000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a reading
    Log {
        /// Device identifier
        device: String,
        /// Sensor type (temperature, humidity)
        sensor_type: String,
        /// Integer value in 0-100
        value: i64,
        /// Creation time (default: now). Supports: "now", "yesterday", ISO 8601, Unix seconds
        #[arg(short, long)]
        time: Option<String>,
    },

    /// List a device's readings
    List {
        /// Device identifier
        device: String,
        /// Only readings of this sensor type
        #[arg(short = 't', long = "type")]
        sensor_type: Option<String>,
        /// Only readings from the last duration (e.g., 1h, 7d, 4w)
        #[arg(short, long)]
        last: Option<String>,
    },

    /// Compute a statistic over a device's readings
    Stat {
        /// Statistic (min, max, mean, median, mode, quartiles)
        statistic: String,
        /// Device identifier
        device: String,
        /// Sensor type (temperature, humidity)
        #[arg(short = 't', long = "type")]
        sensor_type: String,
        /// Window ending now (e.g., 1h, 7d, 4w); required for quartiles
        #[arg(short, long)]
        last: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Log {
            device,
            sensor_type,
            value,
            time,
        } => {
            let sensor_type: SensorType = sensor_type.parse()?;
            let date_created = parse_timestamp(time.as_deref())?;

            let body = serde_json::json!({
                "type": sensor_type,
                "value": value,
                "date_created": date_created,
            });

            let response = client
                .post(readings_url(&cli.api_url, &device, None))
                .json(&body)
                .send()
                .await
                .with_context(|| connect_hint(&cli.api_url))?;

            if response.status().is_success() {
                let data: serde_json::Value = response.json().await?;
                if cli.format == "json" {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                } else {
                    println!(
                        "Logged {} {} for {} at {}",
                        sensor_type,
                        value,
                        device,
                        format_timestamp(date_created)
                    );
                }
            } else {
                return Err(failure(response).await);
            }
        }

        Commands::List {
            device,
            sensor_type,
            last,
        } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(sensor_type) = sensor_type {
                let sensor_type: SensorType = sensor_type.parse()?;
                query.push(("type", sensor_type.to_string()));
            }
            if let Some(last) = last {
                let (start, end) = window(&last)?;
                query.push(("start", start.to_string()));
                query.push(("end", end.to_string()));
            }

            let response = client
                .get(readings_url(&cli.api_url, &device, None))
                .query(&query)
                .send()
                .await
                .with_context(|| connect_hint(&cli.api_url))?;

            if !response.status().is_success() {
                return Err(failure(response).await);
            }

            let readings: Vec<serde_json::Value> = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&readings)?);
            } else {
                print_readings(&readings);
            }
        }

        Commands::Stat {
            statistic,
            device,
            sensor_type,
            last,
        } => {
            let statistic = Statistic::from_str(&statistic).with_context(|| {
                format!(
                    "unknown statistic '{}', expected one of: min, max, mean, median, mode, quartiles",
                    statistic
                )
            })?;
            let sensor_type: SensorType = sensor_type.parse()?;

            let mut query = vec![("type", sensor_type.to_string())];
            match last {
                Some(last) => {
                    let (start, end) = window(&last)?;
                    query.push(("start", start.to_string()));
                    query.push(("end", end.to_string()));
                }
                None if statistic.requires_window() => {
                    bail!("{} needs a window, pass --last (e.g., --last 7d)", statistic);
                }
                None => {}
            }

            let response = client
                .get(readings_url(&cli.api_url, &device, Some(statistic)))
                .query(&query)
                .send()
                .await
                .with_context(|| connect_hint(&cli.api_url))?;

            if response.status() == reqwest::StatusCode::NO_CONTENT {
                println!("No readings match");
                return Ok(());
            }
            if !response.status().is_success() {
                return Err(failure(response).await);
            }

            let data: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_statistic(statistic, &data);
            }
        }

        Commands::Config { output } => {
            let config = sensor_readings::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn readings_url(api_url: &str, device: &str, statistic: Option<Statistic>) -> String {
    let base = api_url.trim_end_matches('/');
    match statistic {
        Some(stat) => format!("{}/devices/{}/readings/{}/", base, device, stat),
        None => format!("{}/devices/{}/readings/", base, device),
    }
}

fn connect_hint(api_url: &str) -> String {
    format!(
        "cannot reach the sensor readings API at {} (is `sensor-api` running?)",
        api_url
    )
}

async fn failure(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    anyhow::anyhow!("request failed ({}): {}", status, text)
}

fn parse_timestamp(time: Option<&str>) -> anyhow::Result<i64> {
    match time {
        None | Some("now") => Ok(Utc::now().timestamp()),
        Some("yesterday") => Ok((Utc::now() - Duration::days(1)).timestamp()),
        Some(s) => {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
                Ok(dt.timestamp())
            } else if let Ok(ts) = s.parse::<i64>() {
                Ok(ts)
            } else {
                bail!("Invalid timestamp format: {}", s)
            }
        }
    }
}

/// Inclusive (start, end) in seconds for a window ending now
fn window(last: &str) -> anyhow::Result<(i64, i64)> {
    let duration = parse_duration(last)?;
    let end = Utc::now();
    Ok(((end - duration).timestamp(), end.timestamp()))
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        Ok(Duration::hours(hours.parse()?))
    } else if let Some(days) = s.strip_suffix('d') {
        Ok(Duration::days(days.parse()?))
    } else if let Some(weeks) = s.strip_suffix('w') {
        Ok(Duration::weeks(weeks.parse()?))
    } else if let Some(months) = s.strip_suffix('m') {
        Ok(Duration::days(months.parse::<i64>()? * 30))
    } else {
        bail!("Invalid duration format: {}. Use: 12h, 7d, 4w, 3m", s)
    }
}

fn format_timestamp(seconds: i64) -> String {
    chrono::DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_readings(readings: &[serde_json::Value]) {
    if readings.is_empty() {
        println!("No readings");
        return;
    }

    println!("{:<22} {:<12} {:>5}", "Created", "Type", "Value");
    println!("{}", "-".repeat(41));

    for reading in readings {
        println!(
            "{:<22} {:<12} {:>5}",
            format_timestamp(reading["date_created"].as_i64().unwrap_or(0)),
            reading["type"].as_str().unwrap_or("-"),
            reading["value"].as_i64().unwrap_or(0)
        );
    }
}

fn print_statistic(statistic: Statistic, data: &serde_json::Value) {
    match statistic {
        Statistic::Min | Statistic::Max => println!(
            "{}: {} at {}",
            statistic,
            data["value"],
            format_timestamp(data["date_created"].as_i64().unwrap_or(0))
        ),
        Statistic::Quartiles => println!(
            "quartiles: lower {} upper {}",
            data["lower"], data["upper"]
        ),
        _ => println!("{}: {}", statistic, data["value"]),
    }
}
