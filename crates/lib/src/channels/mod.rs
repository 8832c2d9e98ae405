//! Communication channel (Telegram).
//!
//! The router depends on the `ChatTransport` trait only; the Telegram
//! connector long-polls for updates and forwards normalized events over an
//! mpsc channel for session/agent handling.

mod inbound;
mod telegram;

use async_trait::async_trait;

pub use inbound::InboundEvent;
pub use telegram::TelegramChannel;

/// Outbound operations the router needs from a chat transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text reply to a chat.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), String>;
    /// Show the typing indicator in a chat.
    async fn send_typing(&self, chat_id: &str) -> Result<(), String>;
    /// Fetch the bytes of a remote file (e.g. a photo) by its file id.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, String>;
}
