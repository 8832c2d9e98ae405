//! Agent seam: session factory + blocking run handle, and the default
//! Ollama-backed nutritionist.
//!
//! `AgentHandle::run` is synchronous by contract; the dispatch bridge is
//! responsible for keeping it off the event-intake path.

use crate::config::AgentConfig;
use crate::llm::{ChatMessage, OllamaClient, OllamaError};
use std::sync::{Arc, Mutex};

const DEFAULT_MODEL: &str = "llama3.2:latest";

const SYSTEM_PROMPT: &str = "Você é a SmartNutri AI, uma assistente nutricional. \
Você cria dietas personalizadas, sugere receitas equilibradas e avalia refeições a partir de fotos. \
Quando a entrada for um caminho de arquivo de imagem, trate-a como a foto de uma refeição enviada pelo usuário e avalie o prato. \
Responda sempre em português, de forma clara e objetiva.";

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("llm call failed: {0}")]
    Llm(#[from] OllamaError),
}

/// One live agent session. `run` blocks for the duration of the model call.
pub trait AgentHandle: Send + Sync {
    fn run(&self, input: &str) -> Result<String, AgentError>;
}

/// Constructs agent sessions keyed by an opaque session id (the Telegram
/// user id in this bot). Construction itself never fails; failures belong
/// to `AgentHandle::run`.
pub trait AgentFactory: Send + Sync {
    fn construct(&self, session_id: &str) -> Arc<dyn AgentHandle>;
}

/// Factory for the default Ollama-backed nutritionist agent.
pub struct NutritionistFactory {
    client: OllamaClient,
    model: String,
    system_prompt: String,
}

impl NutritionistFactory {
    pub fn new(client: OllamaClient, model: String, system_prompt: String) -> Self {
        Self {
            client,
            model,
            system_prompt,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            OllamaClient::new(config.ollama_url.clone()),
            config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
        )
    }
}

impl AgentFactory for NutritionistFactory {
    fn construct(&self, session_id: &str) -> Arc<dyn AgentHandle> {
        Arc::new(NutritionistAgent {
            session_id: session_id.to_string(),
            client: self.client.clone(),
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            history: Mutex::new(Vec::new()),
        })
    }
}

/// Nutritionist agent session: fixed system prompt plus the session's
/// message history. The history mutex also serializes concurrent `run`
/// calls for the same user.
pub struct NutritionistAgent {
    session_id: String,
    client: OllamaClient,
    model: String,
    system_prompt: String,
    history: Mutex<Vec<ChatMessage>>,
}

impl AgentHandle for NutritionistAgent {
    fn run(&self, input: &str) -> Result<String, AgentError> {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(input));

        log::debug!(
            "agent session {}: calling {} with {} messages",
            self.session_id,
            self.model,
            messages.len()
        );
        let reply = self.client.chat(&self.model, messages)?;

        history.push(ChatMessage::user(input));
        history.push(ChatMessage::assistant(&reply.content));
        Ok(reply.content)
    }
}
