use rag_core::error::AppError;

use super::{ChatModel, ChatRequest, ChatResponse};
use crate::client::ServiceClient;

#[derive(Debug, Clone)]
pub struct HttpChatModel {
    client: ServiceClient,
}

impl HttpChatModel {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

impl ChatModel for HttpChatModel {
    fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, AppError> {
        let resp: ChatResponse = self
            .client
            .post_json("/v1/chat", req, "AI_CHAT_FAILED", "chat")?;
        if resp.text.trim().is_empty() {
            return Err(AppError::new("AI_CHAT_FAILED", "Chat response was empty"));
        }
        tracing::debug!(
            model = %req.model,
            documents = req.documents.len(),
            citations = resp.citations.len(),
            "chat completed"
        );
        Ok(resp)
    }
}
