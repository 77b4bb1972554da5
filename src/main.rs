//! mixed-clearing CLI
//!
//! Clear market scenarios from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Clear a scenario file
//! mixed-clearing clear --input scenario.json
//!
//! # Output as JSON
//! mixed-clearing clear --input scenario.json --format json
//!
//! # Generate a random scenario for testing
//! mixed-clearing generate --buyers 10 --sellers 5 --seed 42
//! ```

use mixed_clearing::clearing::AlgorithmConfig;
use mixed_clearing::market::session::SubnetworkClearingMode;
use mixed_clearing::simulation::scenario::Scenario;
use mixed_clearing::simulation::stress_test::{generate_random_scenario, NetworkConfig};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"mixed-clearing: heterogeneous mixed-clearing network solver

USAGE:
    mixed-clearing <COMMAND> [OPTIONS]

COMMANDS:
    clear       Clear one market session described by a scenario file
    generate    Generate a random market scenario (for testing)
    help        Show this message

OPTIONS (clear):
    --input <FILE>      Path to JSON scenario file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --buyers <N>        Number of buyers (default: 5)
    --sellers <N>       Number of sellers (default: 5)
    --seed <N>          RNG seed (default: 0)
    --homogeneous       Pool each resource into one hyperedge
    --algorithm <KIND>  Clearing algorithm kind (default: ascent_march)
    --output <FILE>     Write to file instead of stdout

ENVIRONMENT:
    RUST_LOG            Log filter (default: info)

EXAMPLES:
    mixed-clearing clear --input scenario.json
    mixed-clearing clear --input scenario.json --format json
    mixed-clearing generate --buyers 20 --sellers 10 --seed 7
    mixed-clearing generate --homogeneous --algorithm adaptive_march --output pooled.json"#
    );
}

fn next_value(args: &[String], i: usize, message: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{}", message);
        process::exit(1);
    })
}

fn next_number<T: std::str::FromStr>(args: &[String], i: usize, message: &str) -> T {
    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("{}", message);
        process::exit(1);
    })
}

fn load_scenario(path: &str) -> Scenario {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    Scenario::from_json(&content).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "algorithm": {{ "kind": "ascent_march" }},
  "subnetworks": [ {{ "market": "Loan Market", "resource": "Loan", "mode": "heterogeneous" }} ],
  "buyers": [ {{ "id": "FIRM-1", "response": {{ "curve": {{ "shape": "linear", "intercept": 100.0, "slope": -10.0, "max_rate": 10.0 }} }} }} ],
  "sellers": [ {{ "id": "BANK-1", "response": {{ "curve": {{ "shape": "linear", "intercept": 0.0, "slope": -5.0 }} }} }} ]
}}"#
        );
        process::exit(1);
    })
}

fn cmd_clear(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(next_value(args, i, "--input requires a file path"));
            }
            "--format" => {
                i += 1;
                format = next_value(args, i, "--format requires 'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let scenario = load_scenario(&path);
    let outcome = scenario.run().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if format == "json" {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing result: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", outcome);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = NetworkConfig::default();
    let mut seed = 0u64;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--buyers" => {
                i += 1;
                config.buyer_count = next_number(args, i, "--buyers requires a number");
            }
            "--sellers" => {
                i += 1;
                config.seller_count = next_number(args, i, "--sellers requires a number");
            }
            "--seed" => {
                i += 1;
                seed = next_number(args, i, "--seed requires a number");
            }
            "--homogeneous" => {
                config.mode = SubnetworkClearingMode::Homogeneous;
            }
            "--algorithm" => {
                i += 1;
                let kind = next_value(args, i, "--algorithm requires an algorithm kind");
                let json = format!(r#"{{"kind": "{}"}}"#, kind);
                config.algorithm = serde_json::from_str::<AlgorithmConfig>(&json).unwrap_or_else(|_| {
                    eprintln!("Unknown algorithm: {}", kind);
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(next_value(args, i, "--output requires a file path"));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let scenario = generate_random_scenario(&config, seed);
    let json = scenario.to_json_pretty().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} buyers and {} sellers → {}",
            scenario.buyers.len(),
            scenario.sellers.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "clear" => cmd_clear(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
