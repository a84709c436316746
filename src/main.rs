use anyhow::{Context, Result as AnyhowResult};
use clap::{error::ErrorKind, Parser};
use crossbeam_channel::bounded;
use riveflow::process::{StreamConfig, DEFAULT_MAX_LINE_BYTES};
use riveflow::{
    tracing_setup, InputActor, RenderCommand, RendererActor, RiveflowError, Session, SessionConfig,
    TerminalGuard, TerminalOptions,
};
use std::path::PathBuf;
use std::time::Duration;

/// Supervise a command and browse its output as a live log
#[derive(Parser, Debug)]
#[command(name = "riveflow")]
#[command(about = "Run a command and browse its output as a live, searchable log", long_about = None)]
#[command(version)]
#[command(override_usage = "riveflow [OPTIONS] <COMMAND> [ARGS]...")]
struct Args {
    /// Command to run, followed by its arguments
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,

    /// Write diagnostics to this file (default: riveflow.log in the temp directory)
    #[arg(long, value_name = "PATH", env = "RIVEFLOW_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// How often the output reader checks whether the command exited
    #[arg(long, value_name = "MS", default_value_t = 100)]
    poll_interval_ms: u64,

    /// Pause between stopping and starting the command on restart
    #[arg(long, value_name = "MS", default_value_t = 500)]
    restart_grace_ms: u64,

    /// Split output lines longer than this many bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_LINE_BYTES)]
    max_line_bytes: usize,

    /// Start with auto-scroll off
    #[arg(long)]
    no_auto_scroll: bool,

    /// Scroll the log with the mouse wheel
    #[arg(long)]
    mouse: bool,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            stream: StreamConfig {
                poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
                max_line_bytes: self.max_line_bytes,
                ..defaults.stream
            },
            restart_grace: Duration::from_millis(self.restart_grace_ms),
            auto_scroll: !self.no_auto_scroll,
            terminal: TerminalOptions {
                enable_mouse: self.mouse,
                ..defaults.terminal
            },
            ..defaults
        }
    }
}

fn main() -> AnyhowResult<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let Some((program, program_args)) = args.command.split_first() else {
        eprintln!("{}", RiveflowError::Usage);
        eprintln!("Try 'riveflow --help' for more information.");
        std::process::exit(1);
    };

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(tracing_setup::default_log_path);
    if let Err(err) = tracing_setup::init_global(&log_path) {
        eprintln!("warning: diagnostics log disabled: {err:#}");
    }
    tracing::info!(command = %program, log = %log_path.display(), "riveflow starting");

    run(program, program_args.to_vec(), args.session_config())
}

fn run(program: &str, program_args: Vec<String>, config: SessionConfig) -> AnyhowResult<()> {
    let guard = TerminalGuard::enter(config.terminal).context("Failed to set up the terminal")?;
    let (width, height) = TerminalGuard::size().context("Failed to read the terminal size")?;

    let (render_tx, render_rx) = bounded::<RenderCommand>(16);
    let renderer = RendererActor::spawn(render_rx).context("Failed to start the render thread")?;

    let mut session = Session::new(program, program_args, config.clone());
    session.set_size(width, height);
    let input = InputActor::spawn(session.sender(), config.input_poll_timeout)
        .context("Failed to start the input thread")?;

    session.start();
    session.run(&render_tx);

    input.join();
    let _ = render_tx.send(RenderCommand::Shutdown);
    renderer.join();
    drop(guard);

    tracing::info!("riveflow exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_keeps_its_own_flags() {
        let args = Args::try_parse_from(["riveflow", "tail", "-f", "/var/log/syslog"]).unwrap();
        assert_eq!(args.command, ["tail", "-f", "/var/log/syslog"]);
    }

    #[test]
    fn test_options_before_command() {
        let args = Args::try_parse_from([
            "riveflow",
            "--restart-grace-ms",
            "50",
            "--no-auto-scroll",
            "make",
            "--keep-going",
        ])
        .unwrap();
        assert_eq!(args.command, ["make", "--keep-going"]);

        let config = args.session_config();
        assert_eq!(config.restart_grace, Duration::from_millis(50));
        assert!(!config.auto_scroll);
        assert_eq!(config.stream.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
    }

    #[test]
    fn test_missing_command_parses_to_empty() {
        let args = Args::try_parse_from(["riveflow"]).unwrap();
        assert!(args.command.is_empty());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Args::try_parse_from(["riveflow", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
