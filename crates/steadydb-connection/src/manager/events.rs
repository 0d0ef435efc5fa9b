//! Reconnection events for monitoring

/// Progress of an establishment or reconnection, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectEvent {
    /// An establishment attempt is starting
    Attempting { attempt: u32, max_attempts: u32 },
    /// An establishment attempt failed
    Failed { attempt: u32, error: String },
    /// A connection was opened and passed its probe
    Succeeded { attempts_taken: u32 },
    /// All establishment attempts failed
    Exhausted { total_attempts: u32 },
    /// A connection was opened but the probe on it failed
    ProbeFailed { error: String },
}
