use serde::{Deserialize, Serialize};
use std::fmt;

pub const TASK_TYPE_TEXT2IM: &str = "text2im";

/// Server-reported task status. Values the client does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Rejected,
    Succeeded,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Rejected => "rejected",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Other(s) => s,
        }
    }

    /// `succeeded` and `rejected` never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Rejected | TaskStatus::Succeeded)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => TaskStatus::Pending,
            "rejected" => TaskStatus::Rejected,
            "succeeded" => TaskStatus::Succeeded,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub task_type: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub prompt_id: String,
    #[serde(default)]
    pub prompt: Prompt,
    #[serde(default)]
    pub generations: Generations,
}

impl Task {
    pub fn is_succeeded(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }

    pub fn generation_ids(&self) -> impl Iterator<Item = &str> {
        self.generations.data.iter().map(|g| g.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub prompt_type: String,
    #[serde(default)]
    pub prompt: PromptCaption,
    #[serde(default)]
    pub parent_generation_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptCaption {
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generations {
    #[serde(default)]
    pub data: Vec<GenerationData>,
    #[serde(default)]
    pub object: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub generation: Generation,
    #[serde(default)]
    pub generation_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub image_path: String,
}
