//! Dispatch bridge: runs the blocking agent call off the intake path and
//! maps any failure to a fixed user-safe reply.

use crate::agent::AgentHandle;
use std::sync::Arc;

/// Run `handle.run(request)` on the blocking thread pool. Always produces a
/// reply: the agent's text on success, `fallback` on any failure. Failures
/// are logged with the user id; the caller never observes an error.
pub async fn dispatch(
    handle: Arc<dyn AgentHandle>,
    request: String,
    user_id: &str,
    fallback: &str,
) -> String {
    let result = tokio::task::spawn_blocking(move || handle.run(&request)).await;
    match result {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            log::error!("agent call failed for user {}: {}", user_id, e);
            fallback.to_string()
        }
        Err(e) => {
            log::error!("agent task panicked for user {}: {}", user_id, e);
            fallback.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;
    use crate::llm::OllamaError;

    struct FixedAgent(&'static str);

    impl AgentHandle for FixedAgent {
        fn run(&self, _input: &str) -> Result<String, AgentError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingAgent;

    impl AgentHandle for FailingAgent {
        fn run(&self, _input: &str) -> Result<String, AgentError> {
            Err(AgentError::Llm(OllamaError::Api("boom".to_string())))
        }
    }

    #[tokio::test]
    async fn success_returns_agent_reply() {
        let reply = dispatch(
            Arc::new(FixedAgent("Eat more vegetables")),
            "hello".to_string(),
            "42",
            "fallback",
        )
        .await;
        assert_eq!(reply, "Eat more vegetables");
    }

    #[tokio::test]
    async fn failure_returns_fallback_verbatim() {
        let reply = dispatch(
            Arc::new(FailingAgent),
            "hello".to_string(),
            "42",
            "fallback text",
        )
        .await;
        assert_eq!(reply, "fallback text");
    }
}
