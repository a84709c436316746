//! Input writer: delivers typed lines to the child's stdin.
//!
//! A child that never reads its input fills the pipe, and a blocking write
//! would then stall whoever made it. Each spawn therefore gets one writer
//! thread that owns the stdin endpoint; the session only enqueues lines.
//! Failed writes come back as [`SessionEvent::InputFailed`].

use crate::actor::SessionEvent;
use crate::error::{InputWriteFailure, RiveflowError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::{self, ErrorKind, Write};
use std::thread;

/// Queue into one child's stdin writer thread.
#[derive(Debug)]
pub struct InputWriter {
    lines: Sender<String>,
}

impl InputWriter {
    /// Start the writer thread for one child. The thread ends once the
    /// writer is dropped and its queue is empty.
    pub fn spawn<W: Write + Send + 'static>(
        stdin: W,
        generation: u64,
        events: Sender<SessionEvent>,
    ) -> io::Result<Self> {
        let (lines, queue) = unbounded();
        thread::Builder::new()
            .name(format!("riveflow-stdin-{generation}"))
            .spawn(move || run(stdin, &queue, &events))?;
        Ok(Self { lines })
    }

    /// Queue `text` to be written with a trailing newline. Never blocks.
    pub fn send(&self, text: &str) -> io::Result<()> {
        self.lines
            .send(text.to_string())
            .map_err(|_| io::Error::new(ErrorKind::BrokenPipe, "input stream is closed"))
    }
}

fn run<W: Write>(stdin: W, queue: &Receiver<String>, events: &Sender<SessionEvent>) {
    let mut stdin = Some(stdin);
    for text in queue {
        let result = match stdin.as_mut() {
            Some(stdin) => write_line(stdin, &text),
            None => Err(io::Error::new(ErrorKind::BrokenPipe, "input stream is closed")),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "input not delivered");
            // The pipe is unusable after a failed write; later lines fail fast.
            stdin = None;
            let _ = events.send(SessionEvent::InputFailed(RiveflowError::InputWrite {
                text,
                reason: InputWriteFailure::Pipe(err),
            }));
        }
    }
}

fn write_line<W: Write>(stdin: &mut W, text: &str) -> io::Result<()> {
    stdin.write_all(text.as_bytes())?;
    stdin.write_all(b"\n")?;
    stdin.flush()
}
