//! Shell executor: the shared session object behind every caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::CommandRunner;
use super::bootstrap;
use super::config::ShellConfig;
use super::response::{BootstrapResult, Response};
use crate::channel::{ConsoleChannel, PatternSet, deadline_after, sanitize};
use crate::error::{DriverError, Result};
use crate::transport::{SerialTransport, Transport};

/// One serial shell session shared by many concurrent callers.
///
/// Commands are serialized: the whole "reset buffer, write, read until
/// prompt, clean up" sequence runs under a fair async mutex, so two
/// transcripts never interleave. Callers that find the session busy wait
/// their turn in arrival order.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ttlshell::{CommandRunner, ShellBuilder};
///
/// # async fn example() -> Result<(), ttlshell::Error> {
/// let shell = Arc::new(ShellBuilder::new("/dev/ttyUSB0").username("root").build()?);
/// shell.connect().await?;
///
/// let (ok, message) = shell.ensure_shell(Duration::from_secs(15)).await?.into_parts();
/// if !ok {
///     eprintln!("{message}");
///     return shell.disconnect().await;
/// }
///
/// let response = shell.run("uname -a", Duration::from_secs(5)).await?;
/// println!("{}", response.result);
/// # Ok(())
/// # }
/// ```
pub struct ShellExecutor<T> {
    /// Session configuration.
    config: ShellConfig,

    /// Prompt, login and failure matchers.
    patterns: PatternSet,

    /// The live session (None when disconnected). Held for the full
    /// duration of a command or bootstrap.
    session: Mutex<Option<ConsoleChannel<T>>>,

    /// Mirrors `session.is_some()` without taking the lock.
    connected: AtomicBool,
}

impl<T: Transport> ShellExecutor<T> {
    /// Create a disconnected executor.
    pub fn new(config: ShellConfig, patterns: PatternSet) -> Self {
        Self {
            config,
            patterns,
            session: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    /// Get the session configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Get the pattern set.
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Install an open transport as the session, closing any previous one.
    pub async fn attach(&self, transport: T) {
        let mut session = self.session.lock().await;
        if let Some(mut old) = session.take() {
            if let Err(e) = old.close().await {
                warn!("closing previous session failed: {}", e);
            }
        }
        *session = Some(ConsoleChannel::new(transport, self.config.search_depth));
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Close the session. Does nothing when already disconnected.
    pub async fn disconnect(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut channel) = session.take() {
            channel.close().await?;
            info!("disconnected from {}", self.config.serial.port);
        }
        Ok(())
    }

    /// Wake the console and log in until a shell prompt appears.
    ///
    /// A timeout is reported as `BootstrapResult { ok: false, .. }`; the
    /// session stays open and the caller decides whether to disconnect.
    pub async fn ensure_shell(&self, overall_timeout: Duration) -> Result<BootstrapResult> {
        let mut session = self.session.lock().await;
        let channel = session.as_mut().ok_or(DriverError::NotConnected)?;

        let result = bootstrap::run(
            channel,
            &self.patterns,
            &self.config.credentials,
            &self.config.timing,
            overall_timeout,
        )
        .await;
        self.reap_if_closed(&mut session);
        result
    }

    /// Bootstrap with the configured default timeout.
    pub async fn ensure_shell_default(&self) -> Result<BootstrapResult> {
        self.ensure_shell(self.config.bootstrap_timeout).await
    }

    /// Send a command with the configured default timeout.
    pub async fn send_command(&self, command: &str) -> Result<Response> {
        self.run(command, self.config.command_timeout).await
    }

    /// Drop a session whose transport closed underneath it.
    fn reap_if_closed(&self, session: &mut Option<ConsoleChannel<T>>) {
        if session.as_ref().is_some_and(|channel| !channel.is_open()) {
            warn!("{} closed unexpectedly; dropping session", self.config.serial.port);
            *session = None;
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    /// The critical section: everything here runs with the session locked.
    async fn execute(
        &self,
        channel: &mut ConsoleChannel<T>,
        command: &str,
        timeout: Duration,
    ) -> Result<Response> {
        let start = Instant::now();
        let deadline = deadline_after(start, timeout);

        channel.clear_buffer();
        channel.discard_input().await?;

        debug!("sending command: {:?}", command);
        channel.write_str(&format!("{command}\n")).await?;

        let read = channel
            .read_until_pattern(&self.patterns.prompt, deadline)
            .await?;
        let elapsed = start.elapsed();
        let timed_out = !read.pattern_matched;

        let result = sanitize::normalize_output(&read.data, command, |line| {
            self.patterns.is_prompt_line(line)
        });

        if let Some(phrase) = self.patterns.detect_failure(&result) {
            warn!("command {:?} failed: {}", command, phrase);
            return Ok(
                Response::failed(command, result, read.data, elapsed, phrase)
                    .with_timed_out(timed_out),
            );
        }

        if timed_out {
            if result.is_empty() {
                warn!("command {:?} timed out after {:?} with no output", command, timeout);
                return Ok(Response::failed(command, result, read.data, elapsed, "timeout")
                    .with_timed_out(true));
            }
            debug!("command {:?} hit its timeout; returning partial output", command);
        }

        Ok(Response::new(command, result, read.data, elapsed).with_timed_out(timed_out))
    }
}

impl ShellExecutor<SerialTransport> {
    /// Open the configured serial port and make it the session.
    ///
    /// Any existing session is closed first. Fails with
    /// `TransportError::OpenFailed` when the device cannot be opened.
    pub async fn connect(&self) -> Result<()> {
        self.disconnect().await?;
        let transport = SerialTransport::open(self.config.serial.clone()).await?;
        self.attach(transport).await;
        info!(
            "connected to {} at {} baud",
            self.config.serial.port, self.config.serial.baud_rate
        );
        Ok(())
    }
}

impl<T: Transport> CommandRunner for ShellExecutor<T> {
    /// True between `attach`/`connect` and `disconnect`. A transport that
    /// closes on its own is only noticed by the next `run` or
    /// `ensure_shell`, which then drops the session.
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn run(&self, command: &str, timeout: Duration) -> Result<Response> {
        if !self.is_connected() {
            return Err(DriverError::NotConnected.into());
        }

        let command = command.trim();
        if command.is_empty() {
            return Ok(Response::empty());
        }

        let mut session = self.session.lock().await;
        let channel = session.as_mut().ok_or(DriverError::NotConnected)?;
        let result = self.execute(channel, command, timeout).await;
        self.reap_if_closed(&mut session);
        result
    }
}
