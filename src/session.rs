//! Session: the single owner of all interactive state.
//!
//! A [`Session`] owns the log buffer, the search and filter terms, the mode
//! state machine, the viewport and the process supervisor. Every other
//! thread talks to it through one unbounded queue of [`SessionEvent`]s, and
//! only [`Session::apply`] mutates the buffer. The queue has no
//! backpressure: a child that writes faster than the session drains grows
//! it without bound.

use crate::actor::{InputEvent, RenderCommand, SessionEvent};
use crate::config::SessionConfig;
use crate::error::RiveflowError;
use crate::input::{Action, InputRouter, Mode};
use crate::log::{LogBuffer, ProjectedLine, Source, ViewCache};
use crate::process::{ExitReport, ProcessSupervisor};
use crate::render::{FieldView, Frame, StatusLine, Viewport};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Events applied per [`Session::pump`] call before control returns to the
/// caller, so timers and repaints still run under a flood of output.
const MAX_BATCH: usize = 1024;

/// Interactive supervision session.
pub struct Session {
    config: SessionConfig,
    buffer: LogBuffer,
    view: ViewCache,
    router: InputRouter,
    supervisor: ProcessSupervisor,
    search_term: String,
    filter_term: String,
    auto_scroll: bool,
    viewport: Viewport,
    /// Terminal size as `(width, height)`.
    size: (u16, u16),
    resized: bool,
    dirty: bool,
    quit: bool,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl Session {
    /// Create a session for `command args`. Nothing is spawned until
    /// [`Session::start`].
    pub fn new(command: impl Into<String>, args: Vec<String>, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = unbounded();
        let supervisor = ProcessSupervisor::new(
            command,
            args,
            config.restart_grace,
            config.stream,
            events_tx.clone(),
        );
        Self {
            auto_scroll: config.auto_scroll,
            viewport: Viewport::new(config.auto_scroll),
            config,
            buffer: LogBuffer::new(),
            view: ViewCache::new(),
            router: InputRouter::new(),
            supervisor,
            search_term: String::new(),
            filter_term: String::new(),
            size: (80, 24),
            resized: false,
            dirty: true,
            quit: false,
            events_tx,
            events_rx,
        }
    }

    /// A sender into the session queue, for the input actor.
    pub fn sender(&self) -> Sender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Spawn the child. A failure is already reported as a system line, so
    /// the session keeps running either way.
    pub fn start(&mut self) {
        if let Err(err) = self.supervisor.spawn() {
            tracing::warn!(error = %err, "initial spawn failed");
        }
    }

    /// Set the terminal size used for layout.
    pub fn set_size(&mut self, width: u16, height: u16) {
        if self.size != (width, height) {
            self.size = (width, height);
            self.resized = true;
            self.dirty = true;
        }
    }

    /// The log buffer.
    pub const fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// The active mode.
    pub const fn mode(&self) -> Mode {
        self.router.mode()
    }

    /// Active search term.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Active filter term.
    pub fn filter_term(&self) -> &str {
        &self.filter_term
    }

    /// Whether new output scrolls to the tail.
    pub const fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Whether quit was requested.
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    /// Whether the child is alive.
    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// The filtered, highlighted view of the whole buffer.
    pub fn view(&mut self) -> &[ProjectedLine] {
        self.view
            .view(&self.buffer, &self.filter_term, &self.search_term)
    }

    /// Apply one event. This is the only place the buffer is written.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Input(input) => self.handle_input(&input),
            SessionEvent::Append { source, content } => self.append(source, &content),
            SessionEvent::InputFailed(err) => self.report_input_error(err),
            SessionEvent::Exited { generation, code } => match self.supervisor.on_exited(generation, code) {
                ExitReport::Current => {
                    self.append(Source::System, &format!("Process exited with code {code}"));
                }
                ExitReport::Replaced => {
                    self.append(Source::System, &format!("Previous process exited with code {code}"));
                }
                ExitReport::Unknown => {}
            },
        }
        self.dirty = true;
    }

    /// Wait up to `timeout` for an event, then apply it and whatever else
    /// is already queued. Returns how many events were applied.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        let first = match self.events_rx.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return 0,
        };
        self.apply(first);

        let mut applied = 1;
        while applied < MAX_BATCH {
            let Ok(event) = self.events_rx.try_recv() else {
                break;
            };
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Run timers: a scheduled restart spawns once its grace has elapsed.
    pub fn tick(&mut self, now: Instant) {
        let pending = self.supervisor.restart_pending();
        if let Err(err) = self.supervisor.tick(now) {
            tracing::warn!(error = %err, "restart spawn failed");
        }
        if pending && !self.supervisor.restart_pending() {
            self.dirty = true;
        }
    }

    /// Build the frame for the current state.
    pub fn frame(&mut self) -> Frame {
        let (width, height) = self.size;
        let mode = self.router.mode();
        let log_height = Frame::log_height(height, mode.has_field());

        let view = self
            .view
            .view(&self.buffer, &self.filter_term, &self.search_term);
        let window = self.viewport.window(view.len(), log_height);
        let rows = view[window].to_vec();
        let shown_lines = view.len();

        let field = mode.prompt().map(|prompt| FieldView {
            prompt,
            content: self.router.field().content().to_string(),
            cursor_column: self.router.field().cursor_column(),
        });

        Frame {
            width,
            height,
            rows,
            status: StatusLine {
                mode,
                command: self.supervisor.command_line(),
                running: self.supervisor.is_running(),
                total_lines: self.buffer.len(),
                shown_lines,
                auto_scroll: self.auto_scroll,
                search: self.search_term.clone(),
                filter: self.filter_term.clone(),
            },
            field,
        }
    }

    /// Drive the session until quit, painting through `render`.
    pub fn run(&mut self, render: &Sender<RenderCommand>) {
        let frame_interval = self.config.frame_interval();
        let tick_interval = self.config.tick_interval;
        let mut last_draw: Option<Instant> = None;

        while !self.quit {
            let wait = match (self.dirty, last_draw) {
                (true, Some(at)) => frame_interval.saturating_sub(at.elapsed()).min(tick_interval),
                (true, None) => Duration::ZERO,
                (false, _) => tick_interval,
            };
            self.pump(wait);

            let now = Instant::now();
            self.tick(now);

            if self.resized {
                self.resized = false;
                let (width, height) = self.size;
                let _ = render.send(RenderCommand::Resize { width, height });
            }
            let due = last_draw.map_or(true, |at| now.duration_since(at) >= frame_interval);
            if self.dirty && due {
                if render.send(RenderCommand::Draw(Box::new(self.frame()))).is_err() {
                    tracing::error!("render thread gone, ending session");
                    break;
                }
                self.dirty = false;
                last_draw = Some(now);
            }
        }

        self.shutdown();
    }

    /// Stop the child, escalating to a kill if it lingers.
    pub fn shutdown(&mut self) {
        tracing::info!("session shutting down");
        self.supervisor.shutdown(self.config.shutdown_grace);
    }

    fn handle_input(&mut self, input: &InputEvent) {
        match input {
            InputEvent::Resize { width, height } => self.set_size(*width, *height),
            InputEvent::Error(message) => tracing::warn!(%message, "terminal input error"),
            InputEvent::Shutdown => tracing::debug!("input actor stopped"),
            InputEvent::Key { .. } | InputEvent::Paste(_) | InputEvent::MouseScroll { .. } => {
                for action in self.router.handle(input) {
                    self.execute(action);
                }
            }
        }
    }

    fn execute(&mut self, action: Action) {
        match action {
            Action::WriteInput(text) => match self.supervisor.write_input(&text) {
                Ok(()) => self.append(Source::Input, &format!(">>> {text}")),
                Err(err) => self.report_input_error(err),
            },
            Action::SetSearch(term) => self.search_term = term,
            Action::SetFilter(term) => self.filter_term = term,
            Action::ClearTerms => {
                self.search_term.clear();
                self.filter_term.clear();
            }
            Action::ClearLog => {
                tracing::debug!(lines = self.buffer.len(), "log cleared");
                self.buffer.clear();
                self.viewport.reset(self.auto_scroll);
            }
            Action::Kill => self.supervisor.terminate(),
            Action::Restart => self.supervisor.restart(Instant::now()),
            Action::ToggleAutoScroll => {
                self.auto_scroll = !self.auto_scroll;
                let message = if self.auto_scroll {
                    self.viewport.follow();
                    "Auto-scroll enabled"
                } else {
                    self.viewport.unpin();
                    "Auto-scroll disabled"
                };
                self.append(Source::System, message);
            }
            Action::Scroll(scroll) => {
                let height = Frame::log_height(self.size.1, self.router.mode().has_field());
                let total = self.view().len();
                self.viewport.scroll(scroll, total, height, self.auto_scroll);
            }
            Action::Quit => {
                tracing::info!("quit requested");
                self.quit = true;
            }
        }
    }

    fn report_input_error(&mut self, err: RiveflowError) {
        match err {
            RiveflowError::InputWrite { text, reason } => {
                tracing::warn!(%reason, "input not delivered");
                self.append(Source::System, &format!("Failed to send input {text:?}: {reason}"));
            }
            other => self.append(Source::System, &other.to_string()),
        }
    }

    fn append(&mut self, source: Source, content: &str) {
        self.buffer.append(source, content);
        if self.auto_scroll {
            self.viewport.follow();
        }
    }
}
