//! Local models served by Ollama

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, ChatMessageResponse, MessageRole, request::ChatMessageRequest},
    models::ModelOptions as OllamaOptions,
};

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_PORT: u16 = 11434;

/// Where the Ollama daemon listens
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn from_config(config: OllamaConfig) -> Self {
        let client = Ollama::new(config.host.as_str(), config.port);
        Self { client, config }
    }

    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn to_chat(message: &Message) -> ChatMessage {
        let role = match message.role {
            Role::System => MessageRole::System,
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        ChatMessage::new(role, message.content.clone())
    }

    fn sampling(options: &GenerationOptions) -> OllamaOptions {
        OllamaOptions::default()
            .temperature(options.temperature)
            .top_p(options.top_p)
            .num_predict(i32::try_from(options.max_tokens).unwrap_or(i32::MAX))
            .stop(options.stop_sequences.clone())
    }

    fn usage(response: &ChatMessageResponse) -> Option<TokenUsage> {
        let data = response.final_data.as_ref()?;
        Some(TokenUsage {
            prompt_tokens: saturate(data.prompt_eval_count),
            completion_tokens: saturate(data.eval_count),
        })
    }
}

fn saturate<N: TryInto<u32>>(n: N) -> u32 {
    n.try_into().unwrap_or(u32::MAX)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        if let Err(e) = self.client.list_local_models().await {
            tracing::warn!(host = %self.config.host, port = self.config.port, "Ollama unreachable: {e}");
            return Ok(false);
        }
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let chat = messages.iter().map(Self::to_chat).collect();
        let request = ChatMessageRequest::new(options.model.clone(), chat)
            .options(Self::sampling(options));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::Provider(format!("ollama chat failed: {e}")))?;

        Ok(Completion {
            usage: Self::usage(&response),
            content: response.message.content,
            model: options.model.clone(),
            // the final chunk does not say why generation ended
            finish_reason: Some(FinishReason::Stop),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let local = self
            .client
            .list_local_models()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;
        Ok(local.into_iter().map(|m| m.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_daemon_address() {
        let provider = OllamaProvider::from_config(OllamaConfig::default());
        assert_eq!(provider.config().host, DEFAULT_HOST);
        assert_eq!(provider.config().port, 11434);
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_sampling_forwards_stop_sequences() {
        let options = GenerationOptions {
            stop_sequences: vec!["Observation:".into()],
            max_tokens: 512,
            ..GenerationOptions::for_model("llama3.2")
        };

        let wire = serde_json::to_value(OllamaProvider::sampling(&options)).unwrap();
        assert_eq!(wire["stop"], serde_json::json!(["Observation:"]));
        assert_eq!(wire["num_predict"], 512);
    }

    #[test]
    fn test_roles_map_one_to_one() {
        let chat: Vec<ChatMessage> = [
            Message::system("You are a shopping assistant."),
            Message::user("Buy me socks"),
            Message::assistant("What size?"),
        ]
        .iter()
        .map(OllamaProvider::to_chat)
        .collect();

        assert_eq!(chat.len(), 3);
        assert!(matches!(chat[0].role, MessageRole::System));
        assert!(matches!(chat[1].role, MessageRole::User));
        assert_eq!(chat[2].content, "What size?");
    }
}
