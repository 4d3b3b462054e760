mod sample;
mod sink;
mod source;
mod tracker;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::sample::{decode, decode_environment, parse_hex_payload};
use crate::tracker::{AngleUnit, Orientation};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "skypointer")]
#[command(about = "Telescope mount orientation tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracker and its HTTP API
    Serve {
        #[arg(short, long, default_value = "skypointer.yaml")]
        config: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long, default_value = "skypointer.yaml")]
        config: String,
    },
    /// Decode a hex sensor payload
    Decode {
        payload: String,
        /// Treat the payload as a temperature/humidity/dewpoint reading
        #[arg(long)]
        environment: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Validate { config } => validate(&config),
        Commands::Decode {
            payload,
            environment,
        } => decode_payload(&payload, environment),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error loading {}: {}", path, e);
            None
        }
    }
}

fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    let settings = match config.tracker_settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid tracker settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let reference = settings.reference_pose.to_unit(AngleUnit::Degrees);
    println!("Configuration is valid");
    println!(
        "  reference pose: az {:.4} alt {:.4} (deg)",
        reference.azimuth, reference.altitude
    );
    println!(
        "  thresholds:     az {} alt {} (rad)",
        settings.thresholds.azimuth, settings.thresholds.altitude
    );
    println!("  azimuth range:  {}", settings.azimuth_range);
    println!("  calibration:    {}", settings.strategy);
    match &config.viewer {
        Some(viewer) => println!("  viewer:         {}", viewer.url),
        None => println!("  viewer:         none (log only)"),
    }
    if let Some(source) = &config.source {
        println!("  sample device:  {}", source.device.display());
    }
    println!("  api keys:       {}", config.api_keys.len());
    ExitCode::SUCCESS
}

fn decode_payload(text: &str, environment: bool) -> ExitCode {
    let payload = match parse_hex_payload(text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if environment {
        return match decode_environment(&payload) {
            Ok(env) => {
                println!("{}", env);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Decode error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match decode(&payload) {
        Ok(sample) => {
            let radians = Orientation::from_degrees(
                f64::from(sample.azimuth_deg),
                f64::from(sample.altitude_deg),
            );
            println!(
                "Azimuth: {} deg ({:.6} rad)     Altitude: {} deg ({:.6} rad)",
                sample.azimuth_deg, radians.azimuth, sample.altitude_deg, radians.altitude
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Decode error: {}", e);
            ExitCode::FAILURE
        }
    }
}
