//! Renderer Actor: Dedicated thread for rendering to the terminal.
//!
//! This actor owns stdout while the session runs. It receives frames from
//! the session loop, paints them and flushes each one with a single write.
//! When frames arrive faster than they can be written, only the newest is
//! painted.

use super::messages::RenderCommand;
use crate::render::{Frame, Painter};
use crossbeam_channel::{Receiver, TryRecvError};
use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Renderer actor that handles terminal output.
pub struct RendererActor {
    /// Handle to the render thread.
    handle: Option<JoinHandle<()>>,
}

/// Render statistics for debugging/profiling.
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Total frames painted.
    pub frames: u64,
    /// Frames replaced by a newer one before they were painted.
    pub skipped: u64,
    /// Total bytes written to terminal.
    pub bytes_written: u64,
    /// Average paint time in microseconds.
    pub avg_render_us: u64,
}

impl RenderStats {
    fn record(&mut self, bytes: usize, started: Instant) {
        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.frames += 1;
        self.bytes_written += bytes as u64;
        // Smoothed average
        self.avg_render_us = if self.avg_render_us == 0 {
            elapsed
        } else {
            (self.avg_render_us * 15 + elapsed) / 16
        };
    }
}

impl RendererActor {
    /// Spawn the renderer actor thread, painting to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(receiver: Receiver<RenderCommand>) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("riveflow-render".to_string())
            .spawn(move || {
                let mut stdout = io::stdout();
                match Self::run_loop(&receiver, &mut stdout) {
                    Ok(stats) => tracing::debug!(?stats, "render thread finished"),
                    Err(e) => tracing::error!(error = %e, "render thread failed"),
                }
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the render thread to finish. Send
    /// [`RenderCommand::Shutdown`] first.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main render loop. Returns when told to shut down or when every
    /// sender is gone.
    fn run_loop<W: Write>(receiver: &Receiver<RenderCommand>, out: &mut W) -> io::Result<RenderStats> {
        let mut painter = Painter::new();
        let mut stats = RenderStats::default();

        while let Ok(command) = receiver.recv() {
            let frame = match command {
                RenderCommand::Draw(frame) => frame,
                RenderCommand::Resize { width, height } => {
                    tracing::debug!(width, height, "terminal resized");
                    painter.invalidate();
                    continue;
                }
                RenderCommand::Shutdown => break,
            };
            let Some(frame) = Self::latest(receiver, frame, &mut painter, &mut stats) else {
                break;
            };

            let started = Instant::now();
            let bytes = painter.paint(&frame)?;
            out.write_all(bytes)?;
            out.flush()?;
            stats.record(bytes.len(), started);
        }

        Ok(stats)
    }

    /// Coalesce queued commands: keep the newest frame, apply resizes, and
    /// return `None` if a shutdown is queued.
    fn latest(
        receiver: &Receiver<RenderCommand>,
        mut frame: Box<Frame>,
        painter: &mut Painter,
        stats: &mut RenderStats,
    ) -> Option<Box<Frame>> {
        loop {
            match receiver.try_recv() {
                Ok(RenderCommand::Draw(newer)) => {
                    stats.skipped += 1;
                    frame = newer;
                }
                Ok(RenderCommand::Resize { .. }) => painter.invalidate(),
                Ok(RenderCommand::Shutdown) => return None,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Some(frame),
            }
        }
    }
}
