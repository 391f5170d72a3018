use serde::{Deserialize, Serialize};

use super::task::{Task, TASK_TYPE_TEXT2IM};

pub const DEFAULT_BATCH_SIZE: i32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: GenerateRequestPrompt,
    pub task_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequestPrompt {
    pub batch_size: i32,
    pub caption: String,
}

impl GenerateRequest {
    /// Text-to-image request with the fixed batch size.
    pub fn text_to_image(caption: impl Into<String>) -> Self {
        Self {
            prompt: GenerateRequestPrompt {
                batch_size: DEFAULT_BATCH_SIZE,
                caption: caption.into(),
            },
            task_type: TASK_TYPE_TEXT2IM.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTasksRequest {
    pub limit: Option<u32>,
}

impl ListTasksRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query pairs for the request. A zero limit is the same as none.
    pub fn query(&self) -> Vec<(String, String)> {
        match self.limit {
            Some(limit) if limit > 0 => vec![("limit".to_string(), limit.to_string())],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTasksResponse {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub data: Vec<Task>,
}
