//! # tq-cli — TempoIQ from the terminal
//!
//! Thin command line over `tq-client`. Results go to stdout as pretty JSON
//! (or a table with `--table`); logs go to stderr.
//!
//! - `tq devices [--key K].. [--attr k=v].. [--limit N]` — Find devices.
//! - `tq device <KEY>` — Fetch one device.
//! - `tq read --device K [--sensor S] --start T [--stop T]` — Read rows.
//! - `tq latest --device K [--sensor S]` — Latest value per sensor.
//! - `tq delete-devices --key K` — Delete devices by key.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tq_client::{
    parse_zoned, Client, ClientConfig, Cursor, Device, Error, Find, FindQuery, Fold, ObjectType,
    Period, Pipeline, Result, Row, Search, Selection, Selector, Timestamp,
};

#[derive(Parser)]
#[command(name = "tq", version, about = "TempoIQ command line client", long_about = None)]
struct Cli {
    /// Path to the TOML config file. TQ_* environment variables override it.
    #[arg(long, global = true, default_value = "tq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List devices matching every given filter (all devices if none).
    Devices {
        /// Device key; repeat to match any of several.
        #[arg(long)]
        key: Vec<String>,

        /// Attribute filter as `name=value`; repeat to require several.
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,

        #[arg(long)]
        limit: Option<u64>,

        /// Print a table instead of JSON.
        #[arg(long)]
        table: bool,
    },

    /// Fetch one device by key.
    Device { key: String },

    /// Read data points over a time range.
    Read {
        #[arg(long)]
        device: String,

        #[arg(long)]
        sensor: Option<String>,

        /// Zoned instant, e.g. 2015-01-01T00:00:00.000-05:00.
        #[arg(long, value_parser = parse_timestamp)]
        start: Timestamp,

        /// Defaults to now.
        #[arg(long, value_parser = parse_timestamp)]
        stop: Option<Timestamp>,

        /// Roll up as `PERIOD:FOLD`, e.g. `PT1H:mean`. Buckets start at `--start`.
        #[arg(long, value_parser = parse_rollup)]
        rollup: Option<(Period, Fold)>,

        /// Fold all selected streams into one.
        #[arg(long)]
        aggregate: Option<Fold>,

        /// One record per (device, sensor, point) instead of rows.
        #[arg(long)]
        flat: bool,

        /// Print a table (implies --flat).
        #[arg(long)]
        table: bool,
    },

    /// Latest value of each selected sensor.
    Latest {
        #[arg(long)]
        device: String,

        #[arg(long)]
        sensor: Option<String>,
    },

    /// Delete every device with the given key.
    DeleteDevices {
        #[arg(long)]
        key: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tq=info,tq_client=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::load(Some(cli.config.as_path()))?;
    let client = Client::from_config(&config)?;

    match cli.command {
        Commands::Devices {
            key,
            attributes,
            limit,
            table,
        } => {
            let selector = device_selector(&key, &attributes)?;
            let mut find = Find::all();
            if let Some(limit) = limit {
                find = find.with_limit(limit);
            }
            let query = FindQuery::new(
                Search::new(ObjectType::Devices, Selection::devices(selector)),
                find,
            );
            let devices = client.find_devices(&query)?.to_vec()?;
            if table {
                let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
                println!("{}", Table::new(rows));
            } else {
                print_json(&devices)?;
            }
        }

        Commands::Device { key } => {
            let device = client.get_device(&key)?.into_value()?;
            print_json(&device)?;
        }

        Commands::Read {
            device,
            sensor,
            start,
            stop,
            rollup,
            aggregate,
            flat,
            table,
        } => {
            let stop = stop.unwrap_or_else(|| chrono::Utc::now().fixed_offset());
            let mut pipeline = Pipeline::new();
            if let Some((period, fold)) = rollup {
                pipeline = pipeline.rollup(period, fold, start)?;
            }
            if let Some(fold) = aggregate {
                pipeline = pipeline.aggregate(fold);
            }
            let pipeline = (!pipeline.is_empty()).then_some(pipeline);

            let selection = stream_selection(&device, sensor.as_deref());
            tracing::info!(%device, start = %start, stop = %stop, "reading");
            let cursor = client.read(selection, start, stop, pipeline)?;
            print_rows(&cursor, flat, table)?;
        }

        Commands::Latest { device, sensor } => {
            let cursor = client.latest(stream_selection(&device, sensor.as_deref()))?;
            print_rows(&cursor, false, false)?;
        }

        Commands::DeleteDevices { key } => {
            let summary = client
                .delete_devices(Selection::devices(Selector::key(key)))?
                .into_value()?;
            tracing::info!(deleted = summary.deleted, "devices deleted");
            print_json(&summary)?;
        }
    }

    Ok(())
}

// =============================================================================
// Selection helpers
// =============================================================================

/// Keys are OR-ed, attributes are AND-ed, and the two groups are AND-ed.
fn device_selector(keys: &[String], attributes: &[(String, String)]) -> Result<Selector> {
    let mut parts = Vec::new();
    match keys {
        [] => {}
        [key] => parts.push(Selector::key(key.as_str())),
        _ => parts.push(Selector::or(
            keys.iter().map(|k| Selector::key(k.as_str())).collect(),
        )?),
    }
    if !attributes.is_empty() {
        parts.push(Selector::attributes(attributes.iter().cloned()));
    }
    match parts.len() {
        0 => Ok(Selector::all()),
        1 => Ok(parts.remove(0)),
        _ => Selector::and(parts),
    }
}

fn stream_selection(device: &str, sensor: Option<&str>) -> Selection {
    let selection = Selection::devices(Selector::key(device));
    match sensor {
        Some(sensor) => selection.add(ObjectType::Sensors, Selector::key(sensor)),
        None => selection,
    }
}

// =============================================================================
// Argument parsers
// =============================================================================

fn parse_attribute(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

fn parse_timestamp(raw: &str) -> std::result::Result<Timestamp, String> {
    parse_zoned(raw).map_err(|e| e.to_string())
}

fn parse_rollup(raw: &str) -> std::result::Result<(Period, Fold), String> {
    let (period, fold) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected PERIOD:FOLD, got '{}'", raw))?;
    let period: Period = period.parse().map_err(|e: Error| e.to_string())?;
    let fold: Fold = fold.parse().map_err(|e: Error| e.to_string())?;
    Ok((period, fold))
}

// =============================================================================
// Output
// =============================================================================

#[derive(Tabled)]
struct DeviceRow {
    key: String,
    name: String,
    sensors: String,
    attributes: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            key: d.key.clone(),
            name: d.name.clone(),
            sensors: d
                .sensors
                .iter()
                .map(|s| s.key.as_str())
                .collect::<Vec<_>>()
                .join(","),
            attributes: d
                .attributes
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

#[derive(Serialize, Tabled)]
struct FlatPoint {
    device: String,
    sensor: String,
    t: String,
    v: f64,
}

fn print_rows(cursor: &Cursor<'_, Row>, flat: bool, table: bool) -> Result<()> {
    if flat || table {
        let points = cursor
            .flatten()
            .map(|cell| {
                cell.map(|(device, sensor, point)| FlatPoint {
                    device,
                    sensor,
                    t: tq_client::format_zoned(&point.t),
                    v: point.v,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if table {
            println!("{}", Table::new(points));
            return Ok(());
        }
        return print_json(&points);
    }
    print_json(&cursor.to_vec()?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_device_selector_combinations() {
        assert_eq!(device_selector(&[], &[]).unwrap(), Selector::All);
        assert_eq!(
            device_selector(&["d1".to_string()], &[]).unwrap(),
            Selector::key("d1")
        );
        let both = device_selector(
            &["d1".to_string(), "d2".to_string()],
            &[("building".to_string(), "4".to_string())],
        )
        .unwrap();
        assert_eq!(
            both.to_value(),
            json!({"and": [
                {"or": [{"key": "d1"}, {"key": "d2"}]},
                {"attributes": {"building": "4"}}
            ]})
        );
    }

    #[test]
    fn test_stream_selection() {
        let s = stream_selection("d1", Some("temp"));
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({"devices": {"key": "d1"}, "sensors": {"key": "temp"}})
        );
        assert_eq!(stream_selection("d1", None).get(ObjectType::Sensors), None);
    }

    #[test]
    fn test_argument_parsers() {
        assert_eq!(
            parse_attribute("building=4").unwrap(),
            ("building".to_string(), "4".to_string())
        );
        assert!(parse_attribute("=4").is_err());
        assert!(parse_attribute("building").is_err());

        assert_eq!(
            parse_rollup("PT1H:mean").unwrap(),
            (Period::from_hours(1), Fold::Mean)
        );
        assert!(parse_rollup("PT1H").is_err());
        assert!(parse_rollup("hourly:mean").is_err());

        assert!(parse_timestamp("2015-01-01T00:00:00.000-05:00").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_read_args() {
        let cli = Cli::try_parse_from([
            "tq",
            "read",
            "--device",
            "d1",
            "--start",
            "2015-01-01T00:00:00.000+00:00",
            "--rollup",
            "PT1M:sum",
            "--aggregate",
            "max",
        ])
        .unwrap();
        match cli.command {
            Commands::Read {
                rollup, aggregate, stop, ..
            } => {
                assert_eq!(rollup, Some((Period::from_minutes(1), Fold::Sum)));
                assert_eq!(aggregate, Some(Fold::Max));
                assert!(stop.is_none());
            }
            _ => panic!("expected read"),
        }
    }
}
