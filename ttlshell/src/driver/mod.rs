//! High-level shell driver.
//!
//! The driver layer turns an open transport into a logged-in shell and
//! provides the `run(command, timeout)` API that every consumer uses.

mod bootstrap;
mod builder;
pub mod config;
mod executor;
pub(crate) mod response;

pub use builder::ShellBuilder;
pub use config::{BootstrapTiming, Credentials, ShellConfig};
pub use executor::ShellExecutor;
pub use response::{BootstrapResult, Response};

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// The contract between a shell session and the code that uses it.
///
/// Test views, board checks and report builders take a `CommandRunner`
/// instead of a concrete shell, so they can be handed a shared session
/// explicitly and exercised against a fake one.
pub trait CommandRunner: Send + Sync {
    /// Check if a session is attached.
    fn is_connected(&self) -> bool;

    /// Send one command and wait for the prompt or `timeout`.
    ///
    /// Blank commands succeed immediately with empty output. Fails with
    /// `DriverError::NotConnected` when no session is attached.
    fn run(
        &self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Run several commands in order, stopping at the first error.
    fn run_all(
        &self,
        commands: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.run(cmd, timeout).await?);
            }
            Ok(responses)
        }
    }
}
