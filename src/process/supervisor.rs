//! Process supervisor: owns the lifecycle of the single child process.
//!
//! The supervisor lives on the session thread. It never touches the log
//! buffer; lifecycle messages are posted to the session queue like any
//! other line, so they interleave with program output in arrival order.

use super::multiplexer::{StreamConfig, StreamMultiplexer};
use super::writer::InputWriter;
use crate::actor::SessionEvent;
use crate::error::{InputWriteFailure, Result, RiveflowError};
use crate::log::Source;
use crossbeam_channel::Sender;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// How long a force-killed child gets to be reaped before a restart gives up.
const REAP_TIMEOUT: Duration = Duration::from_secs(1);

/// Shared access to the child for exit polling.
///
/// Both the supervisor and the multiplexer hold one. All reaping and
/// signalling happens under the lock, so a pid is never signalled after it
/// has been reaped.
#[derive(Clone, Debug)]
pub struct ChildProbe {
    child: Arc<Mutex<Child>>,
}

impl ChildProbe {
    pub(crate) fn new(child: Child) -> Self {
        Self {
            child: Arc::new(Mutex::new(child)),
        }
    }

    /// Non-blocking exit check. Returns the exit code once the child is gone.
    pub fn poll_exit(&self) -> io::Result<Option<i32>> {
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(child.try_wait()?.map(exit_code))
    }

    /// Block until the child exits, checking every `interval`.
    pub fn wait(&self, interval: Duration) -> io::Result<i32> {
        loop {
            if let Some(code) = self.poll_exit()? {
                return Ok(code);
            }
            thread::sleep(interval);
        }
    }

    /// Wait at most `timeout` for the child to exit.
    fn wait_timeout(&self, timeout: Duration, interval: Duration) -> io::Result<Option<i32>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(code) = self.poll_exit()? {
                return Ok(Some(code));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(interval);
        }
    }

    /// Send `signal` to the child if it has not exited. Returns whether a
    /// signal was delivered.
    fn signal(&self, signal: StopSignal) -> io::Result<bool> {
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if child.try_wait()?.is_some() {
            return Ok(false);
        }
        send_signal(&mut child, signal)?;
        Ok(true)
    }
}

/// How hard to ask the child to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    /// Polite request (SIGTERM).
    Terminate,
    /// No negotiation (SIGKILL).
    Kill,
}

#[cfg(unix)]
fn send_signal(child: &mut Child, signal: StopSignal) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let signal = match signal {
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Kill => Signal::SIGKILL,
    };
    // The child leads its own process group; signal the whole group so
    // shell pipelines stop too.
    let pid = i32::try_from(child.id()).map_err(io::Error::other)?;
    match kill(Pid::from_raw(-pid), signal) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => kill(Pid::from_raw(pid), signal).map_err(io::Error::from),
        Err(err) => Err(io::Error::from(err)),
    }
}

#[cfg(not(unix))]
fn send_signal(child: &mut Child, _signal: StopSignal) -> io::Result<()> {
    child.kill()
}

/// Map an exit status to a single integer: the exit code, `-signal` when the
/// child was killed by a signal, or `-1`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Which child an exit report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReport {
    /// The current child exited.
    Current,
    /// A child that a restart already replaced exited.
    Replaced,
    /// No child with that generation was ever spawned.
    Unknown,
}

/// The one live child and its input endpoint.
#[derive(Debug)]
pub struct ProcessHandle {
    generation: u64,
    pid: u32,
    probe: ChildProbe,
    input: Option<InputWriter>,
}

impl ProcessHandle {
    /// Generation number of this spawn.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// OS process id.
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Check whether the child is still running.
    pub fn is_alive(&self) -> bool {
        matches!(self.poll_exit(), Ok(None))
    }

    /// Non-blocking exit check; `Some(code)` once the child is gone.
    pub fn poll_exit(&self) -> io::Result<Option<i32>> {
        self.probe.poll_exit()
    }

    /// Block until exit and return the exit code.
    pub fn wait(&self, interval: Duration) -> io::Result<i32> {
        self.probe.wait(interval)
    }

    fn write_line(&self, text: &str) -> io::Result<()> {
        self.input
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "input stream is closed"))?
            .send(text)
    }
}

/// Spawns, stops and restarts the supervised command.
pub struct ProcessSupervisor {
    /// Program to run.
    command: String,
    /// Its arguments.
    args: Vec<String>,
    /// Current handle, if a child was spawned and not yet reported as exited.
    handle: Option<ProcessHandle>,
    /// Generation assigned to the next spawn.
    next_generation: u64,
    /// When a scheduled restart should spawn again.
    restart_at: Option<Instant>,
    /// Delay between terminate and respawn on restart.
    restart_grace: Duration,
    /// Multiplexer settings for each spawn.
    stream_config: StreamConfig,
    /// Session queue.
    events: Sender<SessionEvent>,
}

impl ProcessSupervisor {
    /// Create a supervisor for `command args`. Nothing is spawned yet.
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        restart_grace: Duration,
        stream_config: StreamConfig,
        events: Sender<SessionEvent>,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            handle: None,
            next_generation: 1,
            restart_at: None,
            restart_grace,
            stream_config,
            events,
        }
    }

    /// The full command line, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check whether a child is currently running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(ProcessHandle::is_alive)
    }

    /// The current handle, if any.
    pub const fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    /// Check whether a restart is waiting for its grace interval.
    pub const fn restart_pending(&self) -> bool {
        self.restart_at.is_some()
    }

    /// Launch the command with piped stdio and start multiplexing its output.
    ///
    /// Does nothing while a child is alive.
    pub fn spawn(&mut self) -> Result<()> {
        if self.is_running() {
            tracing::debug!("spawn ignored: process already running");
            return Ok(());
        }

        let command_line = self.command_line();
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::warn!(command = %command_line, error = %source, "spawn failed");
                self.handle = None;
                self.post_system(format!("Failed to start command: {source}"));
                return Err(RiveflowError::Spawn {
                    command: command_line,
                    source,
                });
            }
        };

        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let probe = ChildProbe::new(child);
        let generation = self.next_generation;
        self.next_generation += 1;

        tracing::info!(command = %command_line, pid, generation, "process started");
        self.post_system(format!("Started command: {command_line}"));

        let attached = StreamMultiplexer::spawn(
            generation,
            probe.clone(),
            stdout,
            stderr,
            self.events.clone(),
            self.stream_config,
        )
        .and_then(|()| {
            stdin
                .map(|stdin| InputWriter::spawn(stdin, generation, self.events.clone()))
                .transpose()
        });
        let input = match attached {
            Ok(input) => input,
            Err(source) => {
                tracing::error!(error = %source, "failed to start stream threads");
                let _ = probe.signal(StopSignal::Kill);
                self.post_system(format!("Failed to attach to command: {source}"));
                return Err(RiveflowError::Spawn {
                    command: command_line,
                    source,
                });
            }
        };

        self.handle = Some(ProcessHandle {
            generation,
            pid,
            probe,
            input,
        });
        Ok(())
    }

    /// Ask the running child to stop and cancel any pending restart.
    /// No-op when neither is there.
    pub fn terminate(&mut self) {
        if self.restart_at.take().is_some() {
            tracing::info!("pending restart cancelled");
            self.post_system("Restart cancelled");
        }
        if self.stop(StopSignal::Terminate) {
            self.post_system("Process terminated");
        }
    }

    /// Terminate the child and schedule a fresh spawn after the grace
    /// interval. The spawn happens in [`ProcessSupervisor::tick`].
    pub fn restart(&mut self, now: Instant) {
        if self.stop(StopSignal::Terminate) {
            self.post_system("Process terminated for restart");
        }
        self.restart_at = Some(now + self.restart_grace);
    }

    /// Run a scheduled restart once its grace interval has elapsed.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        match self.restart_at {
            Some(at) if now >= at => {}
            _ => return Ok(()),
        }
        self.restart_at = None;

        if let Some(handle) = &self.handle {
            if handle.is_alive() {
                tracing::info!(pid = handle.pid, "process ignored terminate, killing before restart");
                let _ = handle.probe.signal(StopSignal::Kill);
                match handle.probe.wait_timeout(REAP_TIMEOUT, Duration::from_millis(10)) {
                    Ok(Some(_)) => {}
                    Ok(None) | Err(_) => {
                        self.post_system("Process did not exit; restart abandoned");
                        return Ok(());
                    }
                }
            }
        }
        self.handle = None;
        self.spawn()
    }

    /// Queue a line of text for the child's standard input.
    ///
    /// The write itself happens on the child's writer thread; a failure
    /// there arrives later as [`SessionEvent::InputFailed`].
    pub fn write_input(&self, text: &str) -> Result<()> {
        let handle = match self.handle.as_ref() {
            Some(handle) if handle.is_alive() => handle,
            _ => {
                return Err(RiveflowError::InputWrite {
                    text: text.to_string(),
                    reason: InputWriteFailure::NotRunning,
                })
            }
        };
        handle
            .write_line(text)
            .map_err(|err| RiveflowError::InputWrite {
                text: text.to_string(),
                reason: InputWriteFailure::Pipe(err),
            })
    }

    /// Record that the multiplexer saw generation `generation` exit.
    ///
    /// Only a report for the current child clears the handle; a replaced
    /// child's exit never marks its successor as stopped.
    pub fn on_exited(&mut self, generation: u64, code: i32) -> ExitReport {
        if self.handle.as_ref().map(ProcessHandle::generation) == Some(generation) {
            tracing::info!(generation, code, "process exited");
            self.handle = None;
            ExitReport::Current
        } else if (1..self.next_generation).contains(&generation) {
            tracing::info!(generation, code, "replaced process exited");
            ExitReport::Replaced
        } else {
            tracing::warn!(generation, code, "exit report for an unknown process");
            ExitReport::Unknown
        }
    }

    /// Stop the child on session end, escalating to a kill if it lingers.
    pub fn shutdown(&mut self, grace: Duration) {
        self.restart_at = None;
        let Some(handle) = self.handle.take() else {
            return;
        };
        if matches!(handle.probe.signal(StopSignal::Terminate), Ok(true))
            && !matches!(
                handle.probe.wait_timeout(grace, Duration::from_millis(10)),
                Ok(Some(_))
            )
        {
            let _ = handle.probe.signal(StopSignal::Kill);
        }
    }

    /// Signal the live child. Returns whether there was one.
    fn stop(&self, signal: StopSignal) -> bool {
        let Some(handle) = &self.handle else {
            return false;
        };
        match handle.probe.signal(signal) {
            Ok(delivered) => {
                if delivered {
                    tracing::info!(pid = handle.pid, ?signal, "signalled process");
                }
                delivered
            }
            Err(err) => {
                tracing::warn!(pid = handle.pid, error = %err, "failed to signal process");
                self.post_system(format!("Failed to stop process: {err}"));
                false
            }
        }
    }

    fn post_system(&self, content: impl Into<String>) {
        let _ = self.events.send(SessionEvent::Append {
            source: Source::System,
            content: content.into(),
        });
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            let _ = handle.probe.signal(StopSignal::Kill);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};

    fn supervisor(command: &str, args: &[&str]) -> (ProcessSupervisor, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded();
        let sup = ProcessSupervisor::new(
            command,
            args.iter().map(ToString::to_string).collect(),
            Duration::from_millis(50),
            StreamConfig::default(),
            tx,
        );
        (sup, rx)
    }

    fn next_system_line(rx: &Receiver<SessionEvent>) -> String {
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).expect("event") {
                SessionEvent::Append {
                    source: Source::System,
                    content,
                } => return content,
                _ => continue,
            }
        }
    }

    #[test]
    fn test_command_line_joins_args() {
        let (sup, _rx) = supervisor("tail", &["-f", "/var/log/syslog"]);
        assert_eq!(sup.command_line(), "tail -f /var/log/syslog");
        assert!(!sup.is_running());
    }

    #[test]
    fn test_spawn_missing_executable_reports_error() {
        let (mut sup, rx) = supervisor("riveflow-definitely-not-a-program", &[]);
        let err = sup.spawn().unwrap_err();
        assert!(matches!(err, RiveflowError::Spawn { .. }));
        assert!(sup.handle().is_none());
        assert!(next_system_line(&rx).starts_with("Failed to start command"));
    }

    #[test]
    fn test_spawn_is_idempotent_while_running() {
        let (mut sup, rx) = supervisor("sleep", &["5"]);
        sup.spawn().unwrap();
        let pid = sup.handle().unwrap().pid();

        sup.spawn().unwrap();
        assert_eq!(sup.handle().unwrap().pid(), pid);
        assert_eq!(next_system_line(&rx), "Started command: sleep 5");

        sup.terminate();
        assert_eq!(next_system_line(&rx), "Process terminated");
    }

    #[test]
    fn test_terminate_without_process_is_noop() {
        let (mut sup, rx) = supervisor("true", &[]);
        sup.terminate();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_write_input_without_process_fails() {
        let (sup, _rx) = supervisor("true", &[]);
        let err = sup.write_input("ping").unwrap_err();
        assert!(matches!(
            err,
            RiveflowError::InputWrite {
                reason: InputWriteFailure::NotRunning,
                ..
            }
        ));
    }

    #[test]
    fn test_terminated_process_reports_signal_exit() {
        let (mut sup, _rx) = supervisor("sleep", &["5"]);
        sup.spawn().unwrap();
        sup.terminate();
        let code = sup
            .handle()
            .unwrap()
            .wait(Duration::from_millis(10))
            .unwrap();
        assert_eq!(code, -15);
    }

    #[test]
    fn test_stale_exit_report_is_ignored() {
        let (mut sup, _rx) = supervisor("sleep", &["5"]);
        sup.spawn().unwrap();
        let generation = sup.handle().unwrap().generation();

        assert_eq!(sup.on_exited(generation + 7, 0), ExitReport::Unknown);
        assert!(sup.handle().is_some());

        sup.shutdown(Duration::from_millis(200));
        assert!(sup.handle().is_none());
    }

    #[test]
    fn test_restart_spawns_new_generation() {
        let (mut sup, rx) = supervisor("sleep", &["5"]);
        sup.spawn().unwrap();
        let first = sup.handle().unwrap().generation();
        assert_eq!(next_system_line(&rx), "Started command: sleep 5");

        let now = Instant::now();
        sup.restart(now);
        assert!(sup.restart_pending());
        assert_eq!(next_system_line(&rx), "Process terminated for restart");

        sup.tick(now).unwrap();
        assert_eq!(sup.handle().unwrap().generation(), first);

        sup.tick(now + Duration::from_millis(60)).unwrap();
        assert!(!sup.restart_pending());
        let second = sup.handle().unwrap().generation();
        assert!(second > first);
        assert!(sup.is_running());

        assert_eq!(sup.on_exited(first, -15), ExitReport::Replaced);
        assert_eq!(sup.handle().unwrap().generation(), second);
        sup.terminate();
        assert_eq!(sup.on_exited(second, -15), ExitReport::Current);
        assert!(sup.handle().is_none());
    }

    #[test]
    fn test_kill_during_restart_grace_cancels_respawn() {
        let (mut sup, rx) = supervisor("sleep", &["5"]);
        sup.spawn().unwrap();
        let first = sup.handle().unwrap().generation();
        assert_eq!(next_system_line(&rx), "Started command: sleep 5");

        let now = Instant::now();
        sup.restart(now);
        assert_eq!(next_system_line(&rx), "Process terminated for restart");

        sup.terminate();
        assert!(!sup.restart_pending());
        assert_eq!(next_system_line(&rx), "Restart cancelled");

        sup.tick(now + Duration::from_millis(60)).unwrap();
        assert_eq!(sup.handle().unwrap().generation(), first);
        sup.shutdown(Duration::from_millis(200));
    }
}
