//! Messaging-channel command configuration.
//!
//! The chat transport itself (webhooks, signatures, reply delivery) is an
//! external collaborator; only the command vocabulary the message handler
//! parses is configurable here.

use serde::{Deserialize, Serialize};

/// Default join-command token ("join ABC123" redeems an invite code).
fn default_join_command() -> String {
    "join".to_string()
}

/// Default keyword for listing the student's question banks.
fn default_list_command() -> String {
    "my banks".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagingConfig {
    /// Token that prefixes an invite-code redemption message.
    #[serde(default = "default_join_command")]
    pub join_command: String,

    /// Message text that asks for the student's question-bank list.
    #[serde(default = "default_list_command")]
    pub list_command: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            join_command: default_join_command(),
            list_command: default_list_command(),
        }
    }
}
