use std::fmt;

/// Where a live session is within its cycle.
///
/// The driver moves through these in order on every bar close and logs the
/// transitions; between cycles it sits in `Waiting`, where broker events
/// are still drained and applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Between cycles, listening for the next bar close
    Waiting,
    /// Building features and scoring the universe
    Computing,
    /// Diffing targets and submitting orders
    Executing,
    /// Orders submitted; waiting (bounded) for fills to land
    Settling,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Waiting => "Waiting",
            SessionPhase::Computing => "Computing",
            SessionPhase::Executing => "Executing",
            SessionPhase::Settling => "Settling",
        };
        f.write_str(name)
    }
}
