//! Command abstractions.

use uuid::Uuid;

/// A write request routed through an application-layer handler.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable, dotted name of the command (e.g. `narrative.take_turn`).
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried into every log line the command produces.
    fn correlation_id(&self) -> Uuid;
}
