use serde::{Deserialize, Serialize};

/// A registered member of the shared wallet system.
///
/// One row exists per external account id; users are created the first time a
/// message or group-join event is seen from them and are never mutated or
/// deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Internal surrogate key
    pub id: i64,
    /// External chat-platform account id
    pub user_id: i64,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// The balance record scoped to one chat group.
///
/// `balance` is the algebraic sum of every committed delta ever applied to the
/// group; it is mutated only by the ledger engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAccount {
    /// Internal surrogate key
    pub id: i64,
    /// External chat/group identifier
    pub group_id: i64,
    /// The user who triggered provisioning of this account
    pub user_id: i64,
    /// Running balance in ruble-units
    pub balance: f64,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// Inbound message from the chat front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMessageRequest {
    pub user_id: i64,
    pub group_id: i64,
    /// Raw message text, e.g. "+50руб" or "-20$"
    pub text: String,
}

/// Result of handling an inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMessageResponse {
    /// Whether a balance delta was applied
    pub applied: bool,
    /// The group balance after the delta, when one was applied
    pub new_balance: Option<f64>,
    /// Why the message was ignored, when it was
    pub ignored_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub group_id: i64,
    pub balance: f64,
}

/// Chat accounts a user belongs to, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatAccount>,
}

/// First-seen event for a user (e.g. a private /start).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user: User,
    pub success_message: String,
}

/// Group-join event from the chat front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterChatRequest {
    pub group_id: i64,
    pub user_id: i64,
    /// Group title as reported at join time; logged, not stored
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterChatResponse {
    pub chat: ChatAccount,
    pub success_message: String,
}
