//! Serial shell example: log in over a UART and run commands from stdin
//!
//! This example opens a serial console, waits for a shell prompt
//! (logging in if the board asks), then sends every line typed on stdin
//! as a command and prints the cleaned output.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example serial_shell -- --port /dev/ttyUSB0 --baud 115200 --user root
//! ```
//!
//! List the serial ports found on this machine:
//! ```bash
//! cargo run --example serial_shell -- --list
//! ```

use std::env;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use ttlshell::{CommandRunner, ShellBuilder, available_ports};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list {
        let ports = available_ports()?;
        if ports.is_empty() {
            println!("No serial ports found.");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let Some(port) = args.port else {
        eprintln!("Error: --port is required (use --list to see available ports)");
        std::process::exit(1);
    };

    let shell = ShellBuilder::new(&port)
        .baud_rate(args.baud)
        .username(&args.user)
        .password(args.password.unwrap_or_default())
        .command_timeout(Duration::from_secs(args.timeout))
        .build()?;

    println!("Opening {} at {} baud...", port, args.baud);
    shell.connect().await?;

    println!("Waiting for shell prompt...");
    let bootstrap = shell.ensure_shell_default().await?;
    if !bootstrap.ok {
        eprintln!("{}", bootstrap.message);
        shell.disconnect().await?;
        std::process::exit(1);
    }
    println!("{} ({:?})", bootstrap.message, bootstrap.elapsed);
    println!("Type commands, one per line. Ctrl-D to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let response = shell.send_command(&line).await?;

        if !response.result.is_empty() {
            println!("{}", response.result);
        }
        if let Some(failure) = &response.failure_message {
            eprintln!("[failed: {failure}]");
        } else if response.timed_out {
            eprintln!("[no prompt after {:?}, output may be partial]", response.elapsed);
        }
    }

    println!("\nClosing connection...");
    shell.disconnect().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    port: Option<String>,
    baud: u32,
    user: String,
    password: Option<String>,
    timeout: u64,
    list: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut port = None;
        let mut baud = 115_200u32;
        let mut user = "root".to_string();
        let mut password = None;
        let mut timeout = 10u64;
        let mut list = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = Some(args[i].clone());
                    }
                }
                "--baud" | "-b" => {
                    i += 1;
                    if i < args.len() {
                        baud = args[i].parse().unwrap_or(115_200);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(10);
                    }
                }
                "--list" | "-l" => list = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            port,
            baud,
            user,
            password,
            timeout,
            list,
        }
    }

    fn print_help() {
        println!(
            r#"ttlshell serial_shell example

USAGE:
    cargo run --example serial_shell -- [OPTIONS]

OPTIONS:
    -p, --port <PORT>        Serial device (e.g. /dev/ttyUSB0, COM3)
    -b, --baud <BAUD>        Baud rate [default: 115200]
    -u, --user <USER>        Login username [default: root]
    -P, --password <PASS>    Login password [default: empty]
    -t, --timeout <SECS>     Per-command timeout [default: 10]
    -l, --list               List available serial ports and exit
    --help                   Print this help message
"#
        );
    }
}
