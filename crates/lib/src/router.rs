//! Event router: classifies inbound events and produces exactly one reply
//! for each of the three shapes (start, text, photo).

use crate::channels::{ChatTransport, InboundEvent};
use crate::dispatch::dispatch;
use crate::session::SessionResolver;
use crate::storage::AttachmentStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Onboarding copy sent on /start.
pub const ONBOARDING: &str = "Olá! Eu sou a SmartNutri AI, sua assistente nutricional. 🌱✨\n\
Fui criada para ajudar você a alcançar seus objetivos alimentares de forma prática e eficiente.\n\n\
📋 O que posso fazer por você?\n\
- Criar dietas personalizadas.\n\
- Sugerir receitas deliciosas e equilibradas.\n\
- Avaliar suas refeições através de imagens.\n\n\
Envie uma mensagem ou uma foto do seu prato, e vamos começar sua jornada para uma alimentação mais saudável! 🍎🥗\n\n\
🛡️ Aviso: Todos os dados fornecidos serão salvos para oferecer um atendimento personalizado e melhorar sua experiência.";

/// Fallback reply when a text request fails.
pub const TEXT_FALLBACK: &str =
    "Desculpe, ocorreu um erro ao processar sua solicitação. Por favor, tente novamente.";

/// Fallback reply when an image request fails.
pub const IMAGE_FALLBACK: &str =
    "Desculpe, ocorreu um erro ao processar sua imagem. Por favor, tente novamente.";

/// Routes inbound events to the agent and delivers replies through the
/// transport. One reply per event, always.
pub struct Router {
    transport: Arc<dyn ChatTransport>,
    sessions: Arc<SessionResolver>,
    attachments: AttachmentStore,
}

impl Router {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        sessions: Arc<SessionResolver>,
        attachments: AttachmentStore,
    ) -> Self {
        Self {
            transport,
            sessions,
            attachments,
        }
    }

    /// Consume events until the channel closes. Each event is handled in its
    /// own task so a slow agent exchange never stalls intake.
    pub async fn run(self: Arc<Self>, mut inbound_rx: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = inbound_rx.recv().await {
            let router = self.clone();
            tokio::spawn(async move {
                router.handle_event(event).await;
            });
        }
        log::info!("router: inbound channel closed, stopping");
    }

    /// Handle one event and send exactly one reply.
    pub async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::Start { user_id, chat_id } => {
                if let Err(e) = self.transport.send_message(&chat_id, ONBOARDING).await {
                    log::warn!("router: onboarding reply failed: {}", e);
                }
                log::info!("user {} started a conversation", user_id);
            }
            InboundEvent::Text {
                user_id,
                chat_id,
                text,
            } => {
                if let Err(e) = self.transport.send_typing(&chat_id).await {
                    log::debug!("router: typing indicator failed: {}", e);
                }
                let handle = self.sessions.resolve(&user_id).await;
                let request = format!("telegram_id: {} menssagem: {}", user_id, text);
                let reply = dispatch(handle, request, &user_id, TEXT_FALLBACK).await;
                self.deliver(&chat_id, &user_id, &reply).await;
            }
            InboundEvent::Photo {
                user_id,
                chat_id,
                file_id,
            } => {
                if let Err(e) = self.transport.send_typing(&chat_id).await {
                    log::debug!("router: typing indicator failed: {}", e);
                }
                let reply = match self.persist_photo(&user_id, &file_id).await {
                    Ok(path) => {
                        let handle = self.sessions.resolve(&user_id).await;
                        // the stored path is the whole agent input for photos
                        dispatch(handle, path, &user_id, IMAGE_FALLBACK).await
                    }
                    Err(e) => {
                        log::error!("photo persistence failed for user {}: {}", user_id, e);
                        IMAGE_FALLBACK.to_string()
                    }
                };
                self.deliver(&chat_id, &user_id, &reply).await;
            }
        }
    }

    /// Download the photo through the transport and write it to the
    /// attachment store; returns the stored path as the agent input string.
    async fn persist_photo(&self, user_id: &str, file_id: &str) -> Result<String, String> {
        let bytes = self.transport.download_file(file_id).await?;
        let path = self
            .attachments
            .store(user_id, file_id, &bytes)
            .map_err(|e| e.to_string())?;
        log::debug!("photo from user {} stored at {}", user_id, path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn deliver(&self, chat_id: &str, user_id: &str, reply: &str) {
        if let Err(e) = self.transport.send_message(chat_id, reply).await {
            log::warn!("router: reply delivery failed for user {}: {}", user_id, e);
            return;
        }
        log::info!("reply sent to user {}", user_id);
    }
}
