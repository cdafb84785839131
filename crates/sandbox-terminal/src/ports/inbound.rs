//! Inbound Ports (Driving Ports)
//!
//! The API a console shell uses to type into a terminal and render what it
//! prints.

/// Whether a terminal is waiting on request/response round trips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No round trip pending
    Idle,
    /// At least one round trip has neither been answered nor timed out
    AwaitingResponse { pending: usize },
}

/// Position in a terminal's output, for incremental rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputCursor {
    pub(crate) epoch: u64,
    pub(crate) offset: usize,
}

/// Output produced since a cursor was taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputChunk {
    /// The buffer was cleared since the cursor; `lines` is the whole buffer
    pub cleared: bool,
    /// New lines, oldest first
    pub lines: Vec<String>,
    /// Cursor to pass on the next call
    pub cursor: OutputCursor,
}

/// Primary terminal API (Driving Port)
pub trait TerminalApi: Send + Sync {
    /// Run one typed command line.
    ///
    /// Never fails: every error is printed as a single terminal line.
    fn execute(&self, line: &str);

    /// Ctrl-C. Stops a log follow and any narrated console output.
    fn interrupt(&self);

    /// Every line currently in the buffer.
    fn lines(&self) -> Vec<String>;

    /// Lines added since `cursor`.
    fn output_since(&self, cursor: OutputCursor) -> OutputChunk;

    /// Current round-trip state.
    fn phase(&self) -> SessionPhase;
}
