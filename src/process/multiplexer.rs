//! Stream Multiplexer: drains a child's stdout and stderr into the session.
//!
//! Each spawn gets three threads:
//!
//! ```text
//! ┌───────────────┐  StreamChunk
//! │ stdout reader │ ─────────────┐
//! └───────────────┘              ▼
//!                         ┌─────────────┐  SessionEvent::Append   ┌─────────┐
//!                         │ multiplexer │ ──────────────────────▶ │ Session │
//!                         └─────────────┘  SessionEvent::Exited   └─────────┘
//! ┌───────────────┐              ▲
//! │ stderr reader │ ─────────────┘
//! └───────────────┘
//! ```
//!
//! Readers block on `read()` and forward raw chunks through one shared
//! channel, which keeps per-stream order and lets neither stream starve the
//! other. The multiplexer waits on that channel with a bounded timeout so it
//! also notices process exit and stale partial lines. Order across the two
//! streams is whatever the OS delivered; nothing stronger is promised.

use super::framer::{LineFramer, DEFAULT_MAX_LINE_BYTES};
use super::supervisor::ChildProbe;
use crate::actor::SessionEvent;
use crate::error::RiveflowError;
use crate::log::Source;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::io::{self, ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Tuning knobs for output capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Bounded wait between exit checks.
    pub poll_interval: Duration,
    /// How long an unterminated line may wait before it is shown anyway.
    pub partial_flush: Duration,
    /// How long to keep draining after exit when a stream stays open
    /// (for example because a grandchild inherited it).
    pub drain_timeout: Duration,
    /// Longest line emitted before splitting.
    pub max_line_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            partial_flush: Duration::from_millis(250),
            drain_timeout: Duration::from_secs(1),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

/// One of the child's two output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    const ALL: [Self; 2] = [Self::Stdout, Self::Stderr];

    const fn source(self) -> Source {
        match self {
            Self::Stdout => Source::Stdout,
            Self::Stderr => Source::Stderr,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Stdout => 0,
            Self::Stderr => 1,
        }
    }
}

/// Raw messages from the reader threads.
#[derive(Debug)]
enum StreamChunk {
    Data(Stream, Vec<u8>),
    Eof(Stream),
    Failed(Stream, io::Error),
}

/// Per-stream framing state.
struct StreamState {
    framer: LineFramer,
    open: bool,
}

impl StreamState {
    fn new(max_line_bytes: usize, open: bool) -> Self {
        Self {
            framer: LineFramer::new(max_line_bytes),
            open,
        }
    }
}

/// Entry point for output capture of one child.
pub struct StreamMultiplexer;

impl StreamMultiplexer {
    /// Start the reader threads and the multiplexer thread for one child.
    ///
    /// The threads are detached: they end on their own once the child has
    /// exited and its streams are drained (or the drain deadline passes).
    pub fn spawn<O, E>(
        generation: u64,
        probe: ChildProbe,
        stdout: Option<O>,
        stderr: Option<E>,
        events: Sender<SessionEvent>,
        config: StreamConfig,
    ) -> io::Result<()>
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        let (chunk_tx, chunk_rx) = unbounded();

        let streams = [
            StreamState::new(config.max_line_bytes, stdout.is_some()),
            StreamState::new(config.max_line_bytes, stderr.is_some()),
        ];
        if let Some(stdout) = stdout {
            spawn_reader(stdout, Stream::Stdout, generation, chunk_tx.clone())?;
        }
        if let Some(stderr) = stderr {
            spawn_reader(stderr, Stream::Stderr, generation, chunk_tx.clone())?;
        }
        drop(chunk_tx);

        thread::Builder::new()
            .name(format!("riveflow-mux-{generation}"))
            .spawn(move || {
                let mut mux = Multiplexer {
                    generation,
                    probe,
                    chunks: chunk_rx,
                    events,
                    config,
                    streams,
                };
                mux.run();
            })?;
        Ok(())
    }
}

/// Blocking reader loop for one stream.
fn spawn_reader<R: Read + Send + 'static>(
    mut reader: R,
    stream: Stream,
    generation: u64,
    sender: Sender<StreamChunk>,
) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("riveflow-{}-{generation}", stream.source()))
        .spawn(move || {
            let mut buf = vec![0u8; READ_CHUNK_SIZE];
            loop {
                let message = match reader.read(&mut buf) {
                    Ok(0) => StreamChunk::Eof(stream),
                    Ok(n) => StreamChunk::Data(stream, buf[..n].to_vec()),
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => StreamChunk::Failed(stream, err),
                };
                let done = !matches!(message, StreamChunk::Data(..));
                if sender.send(message).is_err() || done {
                    break;
                }
            }
        })?;
    Ok(())
}

/// State owned by the multiplexer thread.
struct Multiplexer {
    generation: u64,
    probe: ChildProbe,
    chunks: Receiver<StreamChunk>,
    events: Sender<SessionEvent>,
    config: StreamConfig,
    streams: [StreamState; 2],
}

impl Multiplexer {
    fn run(&mut self) {
        let mut exit: Option<(i32, Instant)> = None;

        loop {
            if self.any_open() {
                match self.chunks.recv_timeout(self.config.poll_interval) {
                    Ok(chunk) => {
                        self.handle_chunk(chunk);
                        // Drain whatever else is ready before checking exit.
                        while let Ok(chunk) = self.chunks.try_recv() {
                            self.handle_chunk(chunk);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        for stream in &mut self.streams {
                            stream.open = false;
                        }
                    }
                }
            } else {
                thread::sleep(self.config.poll_interval);
            }

            let now = Instant::now();
            self.flush_stale(now);

            if exit.is_none() {
                exit = self.poll_exit().map(|code| (code, now + self.config.drain_timeout));
            }

            if let Some((code, deadline)) = exit {
                if !self.any_open() || now >= deadline {
                    self.finish(code);
                    return;
                }
            }
        }
    }

    fn handle_chunk(&mut self, chunk: StreamChunk) {
        let now = Instant::now();
        match chunk {
            StreamChunk::Data(stream, bytes) => {
                let lines = self.state(stream).framer.push(&bytes, now);
                for line in lines {
                    self.post(stream.source(), line);
                }
            }
            StreamChunk::Eof(stream) => {
                self.close(stream);
            }
            StreamChunk::Failed(stream, err) => {
                let err = RiveflowError::StreamRead {
                    stream: stream.source(),
                    source: err,
                };
                tracing::warn!(generation = self.generation, error = %err, "stream read failed");
                self.close(stream);
                self.post(Source::System, capitalize(&err.to_string()));
            }
        }
    }

    fn close(&mut self, stream: Stream) {
        let state = self.state(stream);
        state.open = false;
        if let Some(rest) = state.framer.finish() {
            self.post(stream.source(), rest);
        }
    }

    fn flush_stale(&mut self, now: Instant) {
        let timeout = self.config.partial_flush;
        for stream in Stream::ALL {
            if let Some(partial) = self.state(stream).framer.flush_stale(now, timeout) {
                self.post(stream.source(), partial);
            }
        }
    }

    fn poll_exit(&self) -> Option<i32> {
        match self.probe.poll_exit() {
            Ok(code) => code,
            Err(err) => {
                tracing::warn!(generation = self.generation, error = %err, "failed to poll process");
                Some(-1)
            }
        }
    }

    /// Final drain: flush partial lines, then report the exit.
    fn finish(&mut self, code: i32) {
        while let Ok(chunk) = self.chunks.try_recv() {
            self.handle_chunk(chunk);
        }
        for stream in Stream::ALL {
            if let Some(rest) = self.state(stream).framer.finish() {
                self.post(stream.source(), rest);
            }
        }
        if self.any_open() {
            tracing::debug!(generation = self.generation, "output still open after exit, abandoning readers");
        }
        let _ = self.events.send(SessionEvent::Exited {
            generation: self.generation,
            code,
        });
    }

    fn any_open(&self) -> bool {
        self.streams.iter().any(|s| s.open)
    }

    fn state(&mut self, stream: Stream) -> &mut StreamState {
        &mut self.streams[stream.index()]
    }

    fn post(&self, source: Source, content: String) {
        let _ = self.events.send(SessionEvent::Append { source, content });
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
