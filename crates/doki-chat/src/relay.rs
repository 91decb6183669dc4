//! Chat relay: system instruction + caller conversation → provider stream.

use doki_core::Result;
use reqwest::Client;
use tracing::info;

use crate::config::{LLMConfig, MAX_TOKENS, MODEL, PROVIDER_NAME, TEMPERATURE};
use crate::framing::StreamFormat;
use crate::language::{supported_languages, Language};
use crate::providers::{self, BoxedStream};
use crate::types::{ChatMessage, ChatStatus};

/// Outbound message list: the language's system instruction followed by the
/// conversation, untouched and in order.
pub fn build_messages(language: Language, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatMessage::system(language.system_instruction()));
    messages.extend_from_slice(conversation);
    messages
}

/// Stateless relay to the configured provider. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: Client,
    config: LLMConfig,
}

impl ChatRelay {
    pub fn new(config: LLMConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: LLMConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    pub fn stream_format(&self) -> StreamFormat {
        self.config.stream_format
    }

    /// Open the provider stream for `conversation` under `language`'s
    /// instruction.
    ///
    /// Errors are returned only for failures before the first body byte.
    /// Later failures arrive in-stream as `StreamChunk::Error`.
    pub async fn relay(
        &self,
        language: Language,
        conversation: &[ChatMessage],
    ) -> Result<BoxedStream> {
        let messages = build_messages(language, conversation);

        info!(
            "Relaying {} message(s) to {} in {}",
            conversation.len(),
            PROVIDER_NAME,
            language
        );

        let response = providers::open_completion(&self.client, &self.config, &messages).await?;
        Ok(providers::completion_stream(response))
    }

    pub fn status(&self) -> ChatStatus {
        ChatStatus {
            llm_available: self.config.is_configured(),
            llm_provider: PROVIDER_NAME,
            model: MODEL,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream_format: self.config.stream_format.to_string(),
            languages: supported_languages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use doki_core::Error;

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("What are malaria symptoms?"),
            ChatMessage::assistant("Fever, chills and headache are common."),
            ChatMessage::user("Where can I get tested?"),
        ]
    }

    #[test]
    fn test_empty_conversation_yields_system_only() {
        let messages = build_messages(Language::English, &[]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, Language::English.system_instruction());
    }

    #[test]
    fn test_conversation_order_preserved() {
        let input = conversation();
        let messages = build_messages(Language::Luo, &input);
        assert_eq!(messages.len(), input.len() + 1);
        assert_eq!(messages[0], ChatMessage::system(Language::Luo.system_instruction()));
        assert_eq!(&messages[1..], input.as_slice());
    }

    #[test]
    fn test_caller_system_messages_pass_through() {
        let input = vec![ChatMessage::system("caller note"), ChatMessage::user("hi")];
        let messages = build_messages(Language::English, &input);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], input[0]);
    }

    #[test]
    fn test_status_hides_key() {
        let relay = ChatRelay::new(LLMConfig {
            api_key: Some("sk-secret".into()),
            ..LLMConfig::default()
        });
        let status = relay.status();
        assert!(status.llm_available);
        assert_eq!(status.model, "deepseek-chat");
        assert_eq!(status.languages.len(), 4);
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"maxTokens\":1000"));
    }

    #[tokio::test]
    async fn test_relay_without_key_errors() {
        let relay = ChatRelay::new(LLMConfig::default());
        let result = relay.relay(Language::Swahili, &conversation()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_relay_unreachable_provider_errors() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = Client::builder().no_proxy().build().unwrap();
        let relay = ChatRelay::with_client(
            LLMConfig {
                api_key: Some("sk-test".into()),
                base_url: format!("http://{}", addr),
                ..LLMConfig::default()
            },
            client,
        );
        let result = relay.relay(Language::default(), &[]).await;
        assert!(matches!(result, Err(Error::Http(_))));
    }
}
