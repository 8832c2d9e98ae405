//! Inbound chat events: normalized shapes delivered to the router.

/// A private-chat event from the transport, normalized to the three shapes
/// the bot handles. Anything else is dropped by the update classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start` command.
    Start { user_id: String, chat_id: String },
    /// Plain text message.
    Text {
        user_id: String,
        chat_id: String,
        text: String,
    },
    /// Photo message; `file_id` identifies the largest size on the Bot API.
    Photo {
        user_id: String,
        chat_id: String,
        file_id: String,
    },
}
