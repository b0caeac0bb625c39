use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct Message {
	pub id: i32,
	pub is_user: bool,
	pub timestamp: NaiveDateTime,
	pub text: String,
	pub itinerary_id: Option<i32>,
	/// Set when this message's plan generation suspended on a HITL interrupt;
	/// the frontend should offer a review UI and call `/chat/resume` with it.
	#[serde(default)]
	pub pending_review_thread_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MessagePageRequest {
	pub chat_session_id: i32,
	/// Fetch messages ending with this message id. Omit for the latest page.
	pub message_id: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct MessagePageResponse {
	pub message_page: Vec<Message>,
	pub prev_message_id: Option<i32>
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
	pub chat_session_id: i32,
	pub text: String,
	/// Optional itinerary to give the agent context on; defaults to the
	/// chat session's most recent itinerary.
	pub itinerary_id: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateMessageRequest {
	pub message_id: i32,
	pub new_text: String,
	pub itinerary_id: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct SendMessageResponse {
	pub user_message_id: i32,
	pub bot_message: Message
}

#[derive(Deserialize, ToSchema)]
pub struct ResumeRequest {
	pub thread_id: String,
	/// `{"decision": "approve" | "modify" | "cancel" | "retry", ...}` for an
	/// itinerary_review interrupt, or `{"decision": "accept" | "option" |
	/// "cancel", ...}` for a budget_decision interrupt.
	pub decision: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
pub struct ResumeResponse {
	/// True if the run suspended again (e.g. a `retry` re-raised itinerary_review).
	pub awaiting_input: bool,
	pub itinerary_id: Option<i32>,
}
