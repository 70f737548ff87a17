//! Session bootstrap: from a freshly opened port to a shell prompt.
//!
//! The remote image may show a shell straight away, ask for a username,
//! ask for a username and a password, or wait behind a getty "activate
//! this console" banner. Which one is not known up front, so every poll
//! re-checks all of them. Each answered prompt is consumed from the buffer;
//! only output that arrives after an answer can trigger the next one.

use std::time::Duration;

use log::{debug, info, warn};
use regex::Regex;
use secrecy::ExposeSecret;
use tokio::time::Instant;

use super::config::{BootstrapTiming, Credentials};
use super::response::BootstrapResult;
use crate::channel::{ConsoleChannel, PatternSet};
use crate::error::Result;
use crate::transport::Transport;

/// Console requests the bootstrapper knows how to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nudge {
    Login,
    Password,
    Activate,
}

impl Nudge {
    /// Checked in this order; each can fall through to the next.
    const ALL: [Nudge; 3] = [Nudge::Login, Nudge::Password, Nudge::Activate];

    fn pattern(self, patterns: &PatternSet) -> &Regex {
        match self {
            Nudge::Login => &patterns.login,
            Nudge::Password => &patterns.password,
            Nudge::Activate => &patterns.activate,
        }
    }

    fn reply(self, credentials: &Credentials) -> String {
        match self {
            Nudge::Login => format!("{}\n", credentials.username),
            Nudge::Password => format!("{}\n", credentials.password.expose_secret()),
            Nudge::Activate => "\n".to_string(),
        }
    }

    fn drain(self, timing: &BootstrapTiming) -> Duration {
        match self {
            Nudge::Login => timing.login_drain,
            Nudge::Password => timing.password_drain,
            Nudge::Activate => timing.activate_drain,
        }
    }
}

/// Drive the console until a shell prompt shows up or `overall_timeout`
/// elapses.
pub(crate) async fn run<T: Transport>(
    channel: &mut ConsoleChannel<T>,
    patterns: &PatternSet,
    credentials: &Credentials,
    timing: &BootstrapTiming,
    overall_timeout: Duration,
) -> Result<BootstrapResult> {
    let start = Instant::now();
    channel.clear_buffer();

    debug!("bootstrap: waking console ({} nudges)", timing.wake_nudges);
    for _ in 0..timing.wake_nudges {
        channel.write_str("\n").await?;
        tokio::time::sleep(timing.wake_settle).await;
        channel.drain(timing.wake_drain).await?;
    }

    while start.elapsed() < overall_timeout {
        channel.write_str("\n").await?;
        tokio::time::sleep(timing.poll_settle).await;
        channel.drain(timing.poll_drain).await?;

        if channel.buffer().search_full(&patterns.prompt).is_some() {
            let elapsed = start.elapsed();
            info!("bootstrap: shell prompt detected after {:?}", elapsed);
            return Ok(BootstrapResult::ready(elapsed));
        }

        for nudge in Nudge::ALL {
            if !channel.buffer().unconsumed_contains(nudge.pattern(patterns)) {
                continue;
            }

            match nudge {
                Nudge::Login => {
                    debug!("bootstrap: login prompt, sending '{}'", credentials.username)
                }
                Nudge::Password => debug!("bootstrap: password prompt, sending password (hidden)"),
                Nudge::Activate => debug!("bootstrap: activation banner, sending enter"),
            }

            channel.buffer_mut().consume();
            channel.write_str(&nudge.reply(credentials)).await?;
            channel.drain(nudge.drain(timing)).await?;
        }
    }

    let elapsed = start.elapsed();
    warn!("bootstrap: no shell prompt within {:?}", overall_timeout);
    Ok(BootstrapResult::timed_out(elapsed))
}
