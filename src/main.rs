//! airq_service command line.
//!
//! Usage: airq_service [--config <path>] <command> [args]
//!
//!   stations                              list stations with data
//!   summary <station>                     history overview
//!   forecast <station> [--json]           7-day forecast
//!   backtest <station> <YYYY-MM-DD> [--json]
//!   classify <pm25> <pm10>                severity for a pair of values
//!   verify [--json]                       check history and artifacts

use chrono::NaiveDate;
use std::path::PathBuf;
use std::process::ExitCode;

use airq_service::alert::severity::classify_pair;
use airq_service::config::{ServiceConfig, load_config};
use airq_service::logging;
use airq_service::service::ForecastService;
use airq_service::verify;

const DEFAULT_CONFIG: &str = "airq.toml";

const USAGE: &str = "\
usage: airq_service [--config <path>] <command> [args]

commands:
  stations
  summary <station>
  forecast <station> [--json]
  backtest <station> <YYYY-MM-DD> [--json]
  classify <pm25> <pm10>
  verify [--json]";

struct Args {
    config: Option<PathBuf>,
    json: bool,
    positional: Vec<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        config: None,
        json: false,
        positional: Vec::new(),
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                let path = raw.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--json" => args.json = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

/// An explicit `--config` must exist; the default file is optional.
fn resolve_config(path: Option<&PathBuf>) -> Result<ServiceConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|e| e.to_string()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if default.exists() {
                load_config(&default).map_err(|e| e.to_string())
            } else {
                Ok(ServiceConfig::default())
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn parse_value(name: &str, text: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .map_err(|_| format!("{} must be a number, got '{}'", name, text))
}

fn run(args: Args) -> Result<(), String> {
    let positional: Vec<&str> = args.positional.iter().map(String::as_str).collect();

    // classify needs neither config nor data
    if let ["classify", pm25, pm10] = positional.as_slice() {
        let result = classify_pair(parse_value("pm25", pm25)?, parse_value("pm10", pm10)?);
        if args.json {
            return print_json(&result);
        }
        println!(
            "{}  (PM2.5: {}, PM10: {})",
            result.category.name(),
            result.pm25_category.name(),
            result.pm10_category.name()
        );
        return Ok(());
    }

    let config = resolve_config(args.config.as_ref())?;
    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );
    let mut service = ForecastService::from_config(config).map_err(|e| e.to_string())?;

    match positional.as_slice() {
        ["stations"] => {
            let stations = service.stations().map_err(|e| e.to_string())?;
            if args.json {
                return print_json(&stations);
            }
            for id in &stations {
                let name = service.station_name(id);
                if name == *id {
                    println!("{}", id);
                } else {
                    println!("{}  ({})", id, name);
                }
            }
            Ok(())
        }
        ["summary", station] => {
            let summary = service.summary(station).map_err(|e| e.to_string())?;
            if args.json {
                return print_json(&summary);
            }
            println!(
                "{}: {} records, {} to {}",
                service.station_name(station),
                summary.total_records,
                summary.first_date,
                summary.last_date
            );
            for obs in &summary.recent {
                println!(
                    "  {}  PM2.5 {:>7.2}  PM10 {:>7.2}  O3 {:>6.2}  NO2 {:>6.2}  SO2 {:>6.2}",
                    obs.date, obs.pm25, obs.pm10, obs.o3, obs.no2, obs.so2
                );
            }
            Ok(())
        }
        ["forecast", station] => {
            let report = service.forecast(station).map_err(|e| e.to_string())?;
            if args.json {
                return print_json(&report);
            }
            print!("{}", report);
            Ok(())
        }
        ["backtest", station, date] => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| format!("date must be YYYY-MM-DD, got '{}'", date))?;
            let report = service.backtest(station, date).map_err(|e| e.to_string())?;
            if args.json {
                return print_json(&report);
            }
            print!("{}", report);
            Ok(())
        }
        ["verify"] => {
            let report = verify::verify_all(&mut service).map_err(|e| e.to_string())?;
            if args.json {
                return print_json(&report);
            }
            verify::print_summary(&report);
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{}", msg);
            ExitCode::FAILURE
        }
    }
}
