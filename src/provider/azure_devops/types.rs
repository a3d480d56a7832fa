//! Distributed task payloads.

use serde::{Deserialize, Serialize};

/// Envelope used by every Azure DevOps list endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskAgentPool {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskAgent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}
