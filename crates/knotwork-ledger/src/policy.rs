//! Over-limit policies: what to do when an allocation would cross the ceiling.
//!
//! The allocator never decides on its own. It builds a [`LimitBreach`]
//! describing the request and asks its [`OverLimitPolicy`] for a
//! [`LimitDecision`]. Policies are plain values, so tests and
//! subsystems can each inject their own.

use std::fmt;
use std::io::{self, BufRead, Write};

use knotwork_core::ByteSize;

/// Description of an allocation that would leave the ledger at or over
/// its ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimitBreach {
    /// Label the allocation was requested under.
    pub label: String,
    /// Bytes requested by this allocation.
    pub requested: u64,
    /// Bytes outstanding before this allocation.
    pub current: u64,
    /// Configured ceiling in bytes.
    pub limit: u64,
}

impl LimitBreach {
    /// Outstanding bytes if the allocation goes ahead.
    pub fn projected(&self) -> u64 {
        self.current.saturating_add(self.requested)
    }
}

impl fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "allocation '{}' would exceed the memory limit", self.label)?;
        writeln!(f, "    Memory needed:          {}", ByteSize(self.requested))?;
        writeln!(f, "    will be over the limit: {}", ByteSize(self.limit))?;
        write!(f, "    Currently using:        {}", ByteSize(self.current))
    }
}

/// Outcome chosen by an [`OverLimitPolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitDecision {
    /// Terminate the process.
    Abort,
    /// Allocate anyway; the ledger ends up over its ceiling.
    Proceed,
    /// Refuse the allocation; the caller receives an error.
    Reject,
}

/// Decides the fate of an allocation that would breach the ceiling.
///
/// Closures `FnMut(&LimitBreach) -> LimitDecision` implement this trait.
pub trait OverLimitPolicy {
    /// Choose what happens to the breaching allocation.
    fn decide(&mut self, breach: &LimitBreach) -> LimitDecision;
}

impl<F> OverLimitPolicy for F
where
    F: FnMut(&LimitBreach) -> LimitDecision,
{
    fn decide(&mut self, breach: &LimitBreach) -> LimitDecision {
        self(breach)
    }
}

/// Always lets the allocation through.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysProceed;

impl OverLimitPolicy for AlwaysProceed {
    fn decide(&mut self, _breach: &LimitBreach) -> LimitDecision {
        LimitDecision::Proceed
    }
}

/// Always refuses the allocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysReject;

impl OverLimitPolicy for AlwaysReject {
    fn decide(&mut self, _breach: &LimitBreach) -> LimitDecision {
        LimitDecision::Reject
    }
}

/// Terminates the process on any breach.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortOnBreach;

impl OverLimitPolicy for AbortOnBreach {
    fn decide(&mut self, _breach: &LimitBreach) -> LimitDecision {
        LimitDecision::Abort
    }
}

/// Interactive confirmation: prints the breach and a `[y,N]` prompt, then
/// reads one line.
///
/// `y` or `Y` proceeds; anything else, including an empty line, end of
/// input or a read error, aborts. Blocks on the reader, so it is only
/// suitable for attended command-line runs.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use knotwork_ledger::{ConfirmPolicy, LimitBreach, LimitDecision, OverLimitPolicy};
///
/// let breach = LimitBreach { label: "erf".into(), requested: 1024, current: 0, limit: 1 };
/// let mut policy = ConfirmPolicy::new(Cursor::new("y\n"), Vec::new());
/// assert_eq!(policy.decide(&breach), LimitDecision::Proceed);
/// ```
pub struct ConfirmPolicy<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConfirmPolicy<R, W> {
    /// Prompt on `output` and read the answer from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Recover the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn prompt(&mut self, breach: &LimitBreach) -> io::Result<String> {
        writeln!(self.output, "WARNING!!! {breach}")?;
        writeln!(self.output, "Are you sure you want to continue? [y,N]")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer)
    }
}

impl ConfirmPolicy<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the terminal: stdout for the question, stdin for the answer.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> OverLimitPolicy for ConfirmPolicy<R, W> {
    fn decide(&mut self, breach: &LimitBreach) -> LimitDecision {
        let answer = match self.prompt(breach) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "limit confirmation prompt failed");
                return LimitDecision::Abort;
            }
        };
        let (decision, reply) = match answer.trim() {
            "y" | "Y" => (LimitDecision::Proceed, "Continuing..."),
            _ => (LimitDecision::Abort, "Exiting."),
        };
        if let Err(e) = writeln!(self.output, "{reply}") {
            tracing::warn!(error = %e, "limit confirmation reply failed");
        }
        decision
    }
}
