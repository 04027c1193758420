//! Change-aware, rate-limited command dispatch.
//!
//! A command goes out when it differs from the last one sent, or when the
//! cooldown since the last send has expired.  The second rule doubles as a
//! keep-alive: a static command is still refreshed every cooldown.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::Transport;
use crate::control::Command;

/// Default minimum interval between sends of an unchanged command.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(50);

/// What counts as "changed" for the immediate-send rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRule {
    /// Any byte difference in the payload.
    Payload,
    /// Only a change of command class (e.g. F→S); magnitude changes wait
    /// for the cooldown.
    Class,
}

impl ChangeRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payload => "payload",
            Self::Class => "class",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payload" => Some(Self::Payload),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub cooldown: Duration,
    pub change_rule: ChangeRule,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            change_rule: ChangeRule::Payload,
        }
    }
}

/// Result of offering one command to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Unchanged and inside the cooldown window.
    Suppressed,
    /// Transport error; state left untouched.
    Failed,
}

/// Running totals for status logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u64,
    pub suppressed: u64,
    pub failed: u64,
}

/// Owns the transport and the last-sent state.
///
/// Dropping the dispatcher releases the actuators with one final stop
/// command unless [`Dispatcher::release`] already did.
pub struct Dispatcher<T: Transport> {
    transport: T,
    pub config: DispatchConfig,
    stop: Command,
    last_command: Option<Command>,
    last_send: Option<Instant>,
    stats: DispatchStats,
    released: bool,
}

impl<T: Transport> Dispatcher<T> {
    /// `stop` is the canonical stop command of the active scheme.
    pub fn new(transport: T, config: DispatchConfig, stop: Command) -> Self {
        Self {
            transport,
            config,
            stop,
            last_command: None,
            last_send: None,
            stats: DispatchStats::default(),
            released: false,
        }
    }

    pub fn last_command(&self) -> Option<&Command> {
        self.last_command.as_ref()
    }

    pub fn last_send_time(&self) -> Option<Instant> {
        self.last_send
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn stop_command(&self) -> &Command {
        &self.stop
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether `cmd` would be transmitted at `now`.
    pub fn should_send(&self, cmd: &Command, now: Instant) -> bool {
        let (Some(last), Some(last_send)) = (&self.last_command, self.last_send) else {
            return true;
        };
        let changed = match self.config.change_rule {
            ChangeRule::Payload => last.payload() != cmd.payload(),
            ChangeRule::Class => last.class() != cmd.class(),
        };
        changed || now.saturating_duration_since(last_send) > self.config.cooldown
    }

    /// Offer a command; transmit it if the send rule allows.
    pub fn dispatch(&mut self, cmd: Command, now: Instant) -> DispatchOutcome {
        if !self.should_send(&cmd, now) {
            self.stats.suppressed += 1;
            return DispatchOutcome::Suppressed;
        }

        match self.transport.send(cmd.as_bytes()) {
            Ok(()) => {
                debug!(payload = %cmd, class = cmd.class().as_str(), "sent");
                self.last_command = Some(cmd);
                self.last_send = Some(now);
                self.stats.sent += 1;
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!(payload = %cmd, error = %e, "send failed");
                self.stats.failed += 1;
                DispatchOutcome::Failed
            }
        }
    }

    /// Offer the stop command under the normal send rule.
    pub fn dispatch_stop(&mut self, now: Instant) -> DispatchOutcome {
        let stop = self.stop.clone();
        self.dispatch(stop, now)
    }

    /// Send the stop command unconditionally, once.  Later calls and the
    /// drop handler become no-ops.
    pub fn release(&mut self) -> std::io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let result = self.transport.send(self.stop.as_bytes());
        match &result {
            Ok(()) => info!(payload = %self.stop, "released actuators"),
            Err(e) => warn!(payload = %self.stop, error = %e, "final stop failed"),
        }
        result
    }

    /// Generate s-expression for status reporting.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:last {} :sent {} :suppressed {} :failed {} :cooldown-ms {})",
            self.last_command
                .as_ref()
                .map(|c| format!("\"{}\"", c))
                .unwrap_or_else(|| "nil".to_string()),
            self.stats.sent,
            self.stats.suppressed,
            self.stats.failed,
            self.config.cooldown.as_millis(),
        )
    }
}

impl<T: Transport> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
