//! Board check example: run the standard bring-up checks and save a report
//!
//! This example connects to a board's serial console, logs in, runs the
//! CPU, memory, temperature, NAND, USB, network, RTC and system checks,
//! prints a results table and optionally writes a JSON report.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example board_check -- --port /dev/ttyUSB0 --out report.json
//! ```
//!
//! Settings can also come from a JSON file:
//! ```bash
//! cargo run --example board_check -- --config board.json
//! ```
//!
//! with `board.json` like:
//! ```json
//! {
//!   "serial": { "port": "/dev/ttyUSB0", "baud_rate": 115200 },
//!   "credentials": { "username": "root", "password": "" },
//!   "command_timeout": 10.0,
//!   "bootstrap_timeout": 25.0
//! }
//! ```

use std::env;
use std::path::PathBuf;

use ttlshell::diagnostics::run_board_checks;
use ttlshell::{ShellBuilder, ShellConfig, TestReport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut builder = match &args.config {
        Some(path) => ShellBuilder::from_config(ShellConfig::load(path)?),
        None => match &args.port {
            Some(port) => ShellBuilder::new(port),
            None => {
                eprintln!("Error: Must provide either --port or --config");
                std::process::exit(1);
            }
        },
    };
    if let Some(baud) = args.baud {
        builder = builder.baud_rate(baud);
    }
    if let Some(user) = &args.user {
        builder = builder.username(user);
    }
    if let Some(password) = &args.password {
        builder = builder.password(password);
    }
    let shell = builder.build()?;
    let port = shell.config().serial.port.clone();
    let baud = shell.config().serial.baud_rate;

    println!("Connecting to {port} at {baud} baud...");
    shell.connect().await?;

    let bootstrap = shell.ensure_shell_default().await?;
    if !bootstrap.ok {
        eprintln!("{}", bootstrap.message);
        shell.disconnect().await?;
        std::process::exit(1);
    }
    println!("{}\n", bootstrap.message);

    let results = run_board_checks(&shell, shell.config().command_timeout).await?;
    shell.disconnect().await?;

    println!("{:<4} {:<20} Summary", "OK", "Test");
    println!("{}", "-".repeat(70));
    for result in &results {
        let mark = if result.ok { "✔" } else { "✖" };
        println!("{:<4} {:<20} {}", mark, result.name, result.summary);
    }

    let report = TestReport::new(Some(port), Some(baud), results);
    println!("{}", "-".repeat(70));
    println!("{}/{} checks passed", report.passed(), report.results.len());

    if let Some(out) = &args.out {
        report.save(out)?;
        println!("Saved report to {}", out.display());
    }

    if !report.all_ok() {
        std::process::exit(2);
    }
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    port: Option<String>,
    baud: Option<u32>,
    user: Option<String>,
    password: Option<String>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            port: None,
            baud: None,
            user: None,
            password: None,
            config: None,
            out: None,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--port" | "-p" => parsed.port = value,
                "--baud" | "-b" => parsed.baud = value.and_then(|v| v.parse().ok()),
                "--user" | "-u" => parsed.user = value,
                "--password" | "-P" => parsed.password = value,
                "--config" | "-c" => parsed.config = value.map(PathBuf::from),
                "--out" | "-o" => parsed.out = value.map(PathBuf::from),
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"ttlshell board_check example

USAGE:
    cargo run --example board_check -- [OPTIONS]

OPTIONS:
    -p, --port <PORT>        Serial device (e.g. /dev/ttyUSB0, COM3)
    -b, --baud <BAUD>        Baud rate [default: 115200]
    -u, --user <USER>        Login username [default: root]
    -P, --password <PASS>    Login password [default: empty]
    -c, --config <PATH>      Load settings from a JSON file
    -o, --out <PATH>         Save the JSON report here
    --help                   Print this help message
"#
        );
    }
}
