//! Session configuration.

use crate::process::StreamConfig;
use crate::terminal::TerminalOptions;
use std::time::Duration;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Output capture settings for each spawn.
    pub stream: StreamConfig,
    /// Delay between terminate and respawn on restart.
    pub restart_grace: Duration,
    /// How long shutdown waits for the child after SIGTERM before killing it.
    pub shutdown_grace: Duration,
    /// Whether new output scrolls the view to the tail.
    pub auto_scroll: bool,
    /// Longest the session waits for an event before running timers.
    pub tick_interval: Duration,
    /// Target frames per second.
    pub target_fps: u32,
    /// Input poll timeout.
    pub input_poll_timeout: Duration,
    /// Terminal features.
    pub terminal: TerminalOptions,
}

impl SessionConfig {
    /// Minimum time between two painted frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            restart_grace: Duration::from_millis(500),
            shutdown_grace: Duration::from_millis(500),
            auto_scroll: true,
            tick_interval: Duration::from_millis(50),
            target_fps: 60,
            input_poll_timeout: Duration::from_millis(10),
            terminal: TerminalOptions::default(),
        }
    }
}
