use nova_core::MessageId;

/// Notifications a front end can subscribe to for re-rendering.
///
/// Delivery is best-effort over an unbounded channel; a session constructed
/// without a subscriber behaves identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The message list changed (append, removal, or a typing tick)
    Updated,
    /// An assistant message settled with its final text
    Settled { id: MessageId },
    /// An exchange failed and an error message was rendered
    Failed { message: String },
}
