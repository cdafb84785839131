//! Sandbox Console: type mosquitto and Node-RED commands into simulated
//! terminals.
//!
//! The logical clock follows wall-clock time, advanced on every tick. With
//! more than one terminal, output is prefixed with the terminal number and
//! `:N` switches the terminal input goes to.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use sandbox_telemetry::{init_logging, TelemetryConfig};
use sandbox_terminal::{
    ContextTheme, OutputCursor, SandboxConfigBuilder, SandboxContainer, TerminalApi,
    TerminalSession,
};

/// Lesson context, selects the help text
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LessonContext {
    Primary,
    Secondary,
}

impl From<LessonContext> for ContextTheme {
    fn from(context: LessonContext) -> Self {
        match context {
            LessonContext::Primary => ContextTheme::Primary,
            LessonContext::Secondary => ContextTheme::Secondary,
        }
    }
}

/// Sandbox Console: simulated mosquitto and Node-RED terminals
#[derive(Parser, Debug)]
#[command(name = "sandbox-console")]
#[command(about = "Practice mosquitto and Node-RED commands without a broker")]
struct Args {
    /// Lesson context
    #[arg(long, value_enum, default_value = "primary")]
    context: LessonContext,

    /// Reject commands that publish or subscribe
    #[arg(long)]
    read_only: bool,

    /// Round-trip timeout when -W is not given (ms)
    #[arg(long, default_value = "3000")]
    wait_ms: u64,

    /// Delay before the simulated responder replies (ms)
    #[arg(long, default_value = "500")]
    responder_delay_ms: u64,

    /// How often the logical clock catches up with wall time (ms)
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Number of terminals sharing the broker
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=9))]
    terminals: u8,

    /// Log filter directive, overriding SANDBOX_LOG_LEVEL and RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn telemetry(&self) -> TelemetryConfig {
        let config = TelemetryConfig::from_env();
        match &self.log_level {
            Some(level) => config.with_level(level.clone()),
            None => config,
        }
    }
}

struct ConsoleTerminal {
    session: TerminalSession,
    cursor: OutputCursor,
}

struct Console {
    sandbox: SandboxContainer,
    terminals: Vec<ConsoleTerminal>,
    active: usize,
    started: Instant,
}

impl Console {
    fn active_session(&self) -> &TerminalSession {
        &self.terminals[self.active].session
    }

    fn tick(&self) {
        let elapsed = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.sandbox.advance_to(elapsed);
    }

    /// Print whatever every terminal produced since the last flush.
    fn flush(&mut self, out: &mut impl Write) -> io::Result<bool> {
        let prefixed = self.terminals.len() > 1;
        let mut printed = false;

        for (index, terminal) in self.terminals.iter_mut().enumerate() {
            let chunk = terminal.session.output_since(terminal.cursor);
            terminal.cursor = chunk.cursor;

            if chunk.cleared && !prefixed {
                write!(out, "\x1b[2J\x1b[H")?;
            }
            for line in &chunk.lines {
                if prefixed {
                    writeln!(out, "[{}] {line}", index + 1)?;
                } else {
                    writeln!(out, "{line}")?;
                }
                printed = true;
            }
        }

        out.flush()?;
        Ok(printed)
    }

    fn prompt(&self, out: &mut impl Write) -> io::Result<()> {
        if self.terminals.len() > 1 {
            write!(out, "[{}] $ ", self.active + 1)?;
        } else {
            write!(out, "$ ")?;
        }
        out.flush()
    }

    /// Handle one input line. Returns `false` when the console should exit.
    fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        match trimmed {
            "exit" | "quit" => return Ok(false),
            "^C" => self.active_session().interrupt(),
            _ => match trimmed.strip_prefix(':').map(str::parse::<usize>) {
                Some(Ok(n)) if (1..=self.terminals.len()).contains(&n) => self.active = n - 1,
                Some(_) => writeln!(out, "terminals are numbered 1 to {}", self.terminals.len())?,
                None => {
                    self.tick();
                    self.active_session().execute(line);
                }
            },
        }
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.telemetry()).context("failed to initialize logging")?;

    let config = SandboxConfigBuilder::new()
        .read_only(args.read_only)
        .default_wait_ms(args.wait_ms)
        .responder_delay_ms(args.responder_delay_ms)
        .build()
        .context("invalid sandbox configuration")?;

    let sandbox = SandboxContainer::new(config)?;
    let theme = ContextTheme::from(args.context);
    let terminals = (0..args.terminals)
        .map(|_| ConsoleTerminal {
            session: sandbox.open_terminal(theme),
            cursor: OutputCursor::default(),
        })
        .collect();

    let mut console = Console {
        sandbox,
        terminals,
        active: 0,
        started: Instant::now(),
    };

    info!(terminals = args.terminals, context = ?args.context, "Console started");

    let mut stdout = io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms.max(1)));

    writeln!(stdout, "Type 'help' for commands, 'exit' to quit.")?;
    console.prompt(&mut stdout)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if !console.handle_line(&line, &mut stdout)? {
                    break;
                }
                console.flush(&mut stdout)?;
                console.prompt(&mut stdout)?;
            }
            _ = ticker.tick() => {
                console.tick();
                if console.flush(&mut stdout)? {
                    console.prompt(&mut stdout)?;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                writeln!(stdout)?;
                console.active_session().interrupt();
                console.flush(&mut stdout)?;
                console.prompt(&mut stdout)?;
            }
        }
    }

    info!("Console exiting");
    Ok(())
}
