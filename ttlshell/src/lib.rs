//! # ttlshell
//!
//! Async serial console driver for embedded Linux board bring-up.
//!
//! ttlshell opens a UART, talks the board's console into a shell prompt
//! (answering login, password and "activate this console" requests along
//! the way), then runs commands one at a time and hands back their cleaned
//! output. It is expect-style scripting over a raw byte stream: there is no
//! exit status, only text up to the next prompt.
//!
//! ## Features
//!
//! - Serial transport via the `serialport` crate (8-N-1, no flow control)
//! - Prompt detection with scrapli-style tail search
//! - Automatic login handling that never answers the same prompt twice
//! - One shared session for many concurrent callers, serialized in
//!   arrival order
//! - A standard board check suite and JSON reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ttlshell::{CommandRunner, ShellBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ttlshell::Error> {
//!     let shell = ShellBuilder::new("/dev/ttyUSB0")
//!         .baud_rate(115_200)
//!         .username("root")
//!         .build()?;
//!
//!     shell.connect().await?;
//!
//!     let bootstrap = shell.ensure_shell(Duration::from_secs(15)).await?;
//!     if bootstrap.ok {
//!         let response = shell.run("uname -a", Duration::from_secs(5)).await?;
//!         println!("{}", response.result);
//!     }
//!
//!     shell.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod report;
pub mod transport;

// Re-export main types for convenience
pub use channel::PatternSet;
pub use driver::{
    BootstrapResult, CommandRunner, Credentials, Response, ShellBuilder, ShellConfig,
    ShellExecutor,
};
pub use error::Error;
pub use report::{TestReport, TestResult};
pub use transport::{PortInfo, SerialConfig, SerialTransport, Transport, available_ports};
