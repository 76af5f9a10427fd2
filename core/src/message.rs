// Stable message value type at the agent boundary
//
// Whatever framework sits outside the service, only this shape crosses into
// agent code; adapters translate at the edges.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: Role,
    pub text: String,
    pub sender: String,
    pub recipient: String,
}

impl AgentMessage {
    pub fn user(text: impl Into<String>, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }

    /// Build an agent reply addressed back to the sender of `inbound`
    pub fn reply_to(inbound: &AgentMessage, from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            sender: from.into(),
            recipient: inbound.sender.clone(),
        }
    }
}
