//! Execution Engine errors

use meridian_core::OrderId;
use meridian_ports::BrokerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Broker refused an order. Recoverable: logged, never retried, the
    /// instrument simply stays where it was this cycle.
    #[error("Submission rejected for {instrument_id}: {reason}")]
    SubmissionRejected {
        instrument_id: String,
        reason: String,
    },

    /// A transient broker fault survived every retry attempt. Escalated to
    /// fatal: trading halts rather than running on a broken connection.
    #[error("Transient broker error persisted after {attempts} attempts: {source}")]
    TransientExhausted { attempts: u32, source: BrokerError },

    /// Connection is down; the engine refuses new submissions until the
    /// broker reports the session restored.
    #[error("Submissions are paused: broker connection lost")]
    SubmissionsPaused,

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("State persistence failed: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, Error>;
