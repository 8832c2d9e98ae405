//! Telegram channel: long-poll getUpdates, sendMessage/sendChatAction, and
//! file download via getFile + CDN fetch.

use crate::channels::inbound::InboundEvent;
use crate::channels::ChatTransport;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

/// One entry of a photo message's size array. The Bot API orders sizes
/// ascending, so the last entry is the largest.
#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
struct GetFileResponse {
    ok: bool,
    #[serde(default)]
    result: Option<FileInfo>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Telegram connector: long-polls for updates, classifies them into
/// `InboundEvent`s, and exposes the outbound Bot API operations.
pub struct TelegramChannel {
    token: String,
    api_base: String,
    running: AtomicBool,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: String, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| TELEGRAM_API_BASE.to_string());
        Self {
            token,
            api_base,
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the long-poll loop after the current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Start the getUpdates long-poll loop and forward classified events to
    /// the router. Returns a handle to await on shutdown.
    pub fn start_inbound(self: Arc<Self>, inbound_tx: mpsc::Sender<InboundEvent>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!("telegram channel: starting getUpdates long-poll loop");
        tokio::spawn(async move {
            run_get_updates_loop(self, inbound_tx).await;
        })
    }

    /// Call Telegram getUpdates (long poll). Returns (updates, next_offset).
    async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<(Vec<TelegramUpdate>, Option<i64>), String> {
        let url = format!(
            "{}?timeout={}",
            self.api_url("getUpdates"),
            LONG_POLL_TIMEOUT
        );
        let url = if let Some(off) = offset {
            format!("{}&offset={}", url, off)
        } else {
            url
        };
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("getUpdates failed: {} {}", status, body));
        }
        let data: GetUpdatesResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("getUpdates returned ok: false".to_string());
        }
        let next_offset = data
            .result
            .iter()
            .map(|u| u.update_id)
            .max()
            .map(|id| id + 1);
        Ok((data.result, next_offset))
    }
}

/// Classify a Telegram message into an inbound event. Only private chats are
/// routed; `/start` (with or without a @BotName suffix) wins over plain text.
pub fn classify_message(msg: &TelegramMessage) -> Option<InboundEvent> {
    if msg.chat.kind != "private" {
        return None;
    }
    let user_id = msg.from.as_ref()?.id.to_string();
    let chat_id = msg.chat.id.to_string();
    if let Some(ref text) = msg.text {
        let first = text.trim().split_whitespace().next().unwrap_or("");
        if first == "/start" || first.starts_with("/start@") {
            return Some(InboundEvent::Start { user_id, chat_id });
        }
        return Some(InboundEvent::Text {
            user_id,
            chat_id,
            text: text.clone(),
        });
    }
    if let Some(ref sizes) = msg.photo {
        if let Some(largest) = sizes.last() {
            return Some(InboundEvent::Photo {
                user_id,
                chat_id,
                file_id: largest.file_id.clone(),
            });
        }
    }
    None
}

async fn run_get_updates_loop(
    channel: Arc<TelegramChannel>,
    inbound_tx: mpsc::Sender<InboundEvent>,
) {
    let mut offset: Option<i64> = None;
    while channel.running() {
        match channel.get_updates(offset).await {
            Ok((updates, next)) => {
                offset = next;
                for u in updates {
                    let Some(ref msg) = u.message else { continue };
                    if let Some(event) = classify_message(msg) {
                        if inbound_tx.send(event).await.is_err() {
                            log::debug!("telegram: inbound channel closed, stopping loop");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                log::debug!("telegram getUpdates error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("telegram channel: getUpdates loop stopped");
}

#[async_trait]
impl ChatTransport for TelegramChannel {
    /// Send a text message to a chat via sendMessage.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), String> {
        let url = self.api_url("sendMessage");
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("sendMessage failed: {} {}", status, body));
        }
        Ok(())
    }

    /// Show the typing indicator via sendChatAction. Expires after ~5s on
    /// Telegram's side; callers re-send before each slow operation.
    async fn send_typing(&self, chat_id: &str) -> Result<(), String> {
        let url = self.api_url("sendChatAction");
        let body = serde_json::json!({ "chat_id": chat_id, "action": "typing" });
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("sendChatAction failed: {} {}", status, body));
        }
        Ok(())
    }

    /// Resolve a file id via getFile, then fetch the bytes from the file CDN.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, String> {
        let url = self.api_url("getFile");
        let res = self
            .client
            .get(&url)
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("getFile failed: {} {}", status, body));
        }
        let data: GetFileResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("getFile returned ok: false".to_string());
        }
        let file_path = data
            .result
            .and_then(|f| f.file_path)
            .ok_or("getFile: missing file_path in response")?;
        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, file_path);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            return Err(format!("file download failed: {}", res.status()));
        }
        let bytes = res.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: serde_json::Value) -> TelegramMessage {
        serde_json::from_value(json).expect("parse message")
    }

    #[test]
    fn private_text_becomes_text_event() {
        let msg = message(serde_json::json!({
            "chat": { "id": 100, "type": "private" },
            "from": { "id": 42 },
            "text": "hello"
        }));
        assert_eq!(
            classify_message(&msg),
            Some(InboundEvent::Text {
                user_id: "42".to_string(),
                chat_id: "100".to_string(),
                text: "hello".to_string(),
            })
        );
    }

    #[test]
    fn start_command_becomes_start_event() {
        for text in ["/start", "  /start  ", "/start@SmartNutriBot"] {
            let msg = message(serde_json::json!({
                "chat": { "id": 100, "type": "private" },
                "from": { "id": 42 },
                "text": text
            }));
            assert_eq!(
                classify_message(&msg),
                Some(InboundEvent::Start {
                    user_id: "42".to_string(),
                    chat_id: "100".to_string(),
                }),
                "text: {:?}",
                text
            );
        }
    }

    #[test]
    fn photo_picks_largest_size() {
        let msg = message(serde_json::json!({
            "chat": { "id": 100, "type": "private" },
            "from": { "id": 7 },
            "photo": [
                { "file_id": "small" },
                { "file_id": "medium" },
                { "file_id": "large" }
            ]
        }));
        assert_eq!(
            classify_message(&msg),
            Some(InboundEvent::Photo {
                user_id: "7".to_string(),
                chat_id: "100".to_string(),
                file_id: "large".to_string(),
            })
        );
    }

    #[test]
    fn group_chat_is_not_routed() {
        let msg = message(serde_json::json!({
            "chat": { "id": -100, "type": "group" },
            "from": { "id": 42 },
            "text": "hello"
        }));
        assert_eq!(classify_message(&msg), None);
    }

    #[test]
    fn message_without_sender_is_not_routed() {
        let msg = message(serde_json::json!({
            "chat": { "id": 100, "type": "private" },
            "text": "hello"
        }));
        assert_eq!(classify_message(&msg), None);
    }

    #[test]
    fn empty_photo_array_is_not_routed() {
        let msg = message(serde_json::json!({
            "chat": { "id": 100, "type": "private" },
            "from": { "id": 7 },
            "photo": []
        }));
        assert_eq!(classify_message(&msg), None);
    }
}
