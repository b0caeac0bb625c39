use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ChatSessionSummary {
	pub id: i32,
	pub title: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatsResponse {
    pub chat_sessions: Vec<ChatSessionSummary>
}

#[derive(Serialize, ToSchema)]
pub struct NewChatResponse {
    pub chat_session_id: i32
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
	pub id: i32,
	pub new_title: String,
}
