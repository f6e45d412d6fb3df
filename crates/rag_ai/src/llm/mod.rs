use rag_core::domain::{Citation, DocumentRecord};
use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

/// One grounded chat turn: an instruction message plus the documents it may cite.
///
/// Document order matters; citation ids returned by the service index into `documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
            preamble: None,
            documents: Vec::new(),
            temperature: None,
        }
    }

    pub fn with_documents(mut self, documents: Vec<DocumentRecord>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

pub trait ChatModel {
    fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, AppError>;

    /// Plain completion with no documents; returns the generated text.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let req = ChatRequest::new(model, prompt).with_temperature(0.0);
        Ok(self.chat(&req)?.text)
    }
}

pub mod http_chat;
