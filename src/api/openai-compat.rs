//! Request and response shapes of the OpenAI-compatible chat API

use serde::{Deserialize, Serialize};

use crate::storage::{Attachment, AttachmentKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCompletionRequest {
    /// Omitted when unset so the server applies its default model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<RequestMessage>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Builds a streaming request for a single user turn with its context files
pub fn build_request(
    prompt: &str,
    attachments: &[Attachment],
    model: Option<&str>,
) -> ChatCompletionRequest {
    let mut content = vec![ContentPart::Text {
        text: prompt.to_string(),
    }];
    content.extend(attachments.iter().map(attachment_part));

    ChatCompletionRequest {
        model: model.map(str::to_string),
        messages: vec![RequestMessage {
            role: "user".to_string(),
            content,
        }],
        stream: true,
    }
}

fn attachment_part(attachment: &Attachment) -> ContentPart {
    match attachment.kind {
        AttachmentKind::Image => ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: attachment.content.clone(),
            },
        },
        AttachmentKind::Text => ContentPart::Text {
            text: format!(
                "--- Context file: {} ---\n{}",
                attachment.name, attachment.content
            ),
        },
    }
}

// -- Model listing --

#[derive(Debug, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ModelList {
    /// Model identifiers in server order (`id`, else `name`, else empty)
    pub fn into_ids(self) -> Vec<String> {
        self.data
            .into_iter()
            .map(|model| {
                model
                    .id
                    .filter(|id| !id.is_empty())
                    .or(model.name)
                    .unwrap_or_default()
            })
            .collect()
    }
}
