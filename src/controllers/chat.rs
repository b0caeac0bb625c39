use axum::{
	Extension, Json,
	extract::Path,
	response::sse::{Event, KeepAlive, Sse},
	routing::{delete, get, post},
};
use futures::{Stream, StreamExt};
use sqlx::PgPool;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use utoipa::OpenApi;

use crate::{
	agent::chat::ChatAgent,
	agent::chat::stream::ChatStreamEvent,
	agent::chat::tools::ToolContext,
	agent::models::context::TripContextBlock,
	agent::runtime::AgentRuntime,
	controllers::AxumRouter,
	error::{ApiResult, AppError},
	global::MESSAGE_PAGE_LEN,
	http_models::{
		chat_session::{ChatsResponse, NewChatResponse, RenameRequest},
		message::{Message, MessagePageRequest, MessagePageResponse, ResumeRequest, ResumeResponse, SendMessageRequest, SendMessageResponse, UpdateMessageRequest},
	},
	middleware::{AuthUser, auth_middleware},
	sql_models::message::{ChatSessionRow, MessageRow},
	swagger::SecurityAddon,
};

#[derive(OpenApi)]
#[openapi(
	paths(
		api_chats,
		api_new_chat,
		api_message_page,
		api_send_message,
		api_send_message_stream,
		api_update_message,
		api_delete_chat,
		api_rename,
		api_resume
	),
	modifiers(&SecurityAddon),
	security(("set-cookie"=[])),
    info(
    	title="Chat Routes",
    	description = "API endpoints dealing with chatting and the home page."
    ),
    tags((name="Chat"))
)]
pub struct ChatApiDoc;

/// Loads the context block for whatever itinerary should be shown to the
/// model: the one explicitly requested, or failing that, the chat
/// session's most recent one.
async fn load_context(
	account_id: i32,
	chat_session_id: i32,
	itinerary_id: Option<i32>,
	pool: &PgPool,
) -> ApiResult<(Option<i32>, Option<TripContextBlock>)> {
	let itinerary_id = match itinerary_id {
		Some(id) => Some(id),
		None => sqlx::query!(
			r#"
			SELECT m.itinerary_id
			FROM messages m
			INNER JOIN chat_sessions c ON m.chat_session_id = c.id
			WHERE c.account_id = $1 AND c.id = $2 AND m.itinerary_id IS NOT NULL
			ORDER BY m.timestamp DESC
			LIMIT 1;
			"#,
			account_id,
			chat_session_id
		)
		.fetch_optional(pool)
		.await
		.map_err(AppError::from)?
		.and_then(|record| record.itinerary_id),
	};

	let Some(id) = itinerary_id else {
		return Ok((None, None));
	};

	let row = sqlx::query!("SELECT body FROM itineraries WHERE id = $1 AND account_id = $2", id, account_id)
		.fetch_optional(pool)
		.await
		.map_err(AppError::from)?;

	let context = row.and_then(|row| serde_json::from_value::<crate::agent::models::itinerary::FinalItinerary>(row.body).ok()).map(|itinerary| {
		TripContextBlock {
			trip_id: id.to_string(),
			destination: itinerary.destination.clone(),
			start_date: itinerary.days.first().map(|d| d.date.clone()).unwrap_or_default(),
			end_date: itinerary.days.last().map(|d| d.date.clone()).unwrap_or_default(),
			budget: itinerary.cost.total as i64,
			traveler_count: 1,
			daily_summary: itinerary
				.days
				.iter()
				.map(|d| format!("Day {}: {}", d.day_index, d.activities.iter().map(|a| a.name.clone()).collect::<Vec<_>>().join(", ")))
				.collect(),
		}
	});

	Ok((Some(id), context))
}

/// Inserts a freshly-generated itinerary as a new row and returns its id.
/// Shared by the in-turn `confirm_and_generate_trip` path and by `/resume`
/// finishing a HITL-suspended run.
async fn persist_itinerary(pool: &PgPool, account_id: i32, chat_session_id: i32, itinerary: &crate::agent::models::itinerary::FinalItinerary) -> ApiResult<i32> {
	let body = serde_json::to_value(itinerary).map_err(|e| AppError::Internal(e.to_string()))?;
	let today = chrono::Utc::now().date_naive();
	let title = format!("{} trip", itinerary.destination);
	let start_date = itinerary.days.first().and_then(|d| chrono::NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").ok()).unwrap_or(today);
	let end_date = itinerary.days.last().and_then(|d| chrono::NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").ok()).unwrap_or(today);

	let id = sqlx::query!(
		r#"
		INSERT INTO itineraries (account_id, is_public, start_date, end_date, chat_session_id, saved, title, body)
		VALUES ($1, FALSE, $2, $3, $4, FALSE, $5, $6)
		RETURNING id;
		"#,
		account_id,
		start_date,
		end_date,
		chat_session_id,
		title,
		body,
	)
	.fetch_one(pool)
	.await
	.map_err(AppError::from)?
	.id;
	Ok(id)
}

/// Drives one chat turn through `ChatAgent`, persists any itinerary the
/// plan-generation tool produced, and returns the message to show the user.
///
/// # Warning!
/// Assumes the user's message has already been inserted into the db.
async fn send_message_to_llm(
	text: &str,
	account_id: i32,
	chat_session_id: i32,
	itinerary_id: Option<i32>,
	pool: &PgPool,
	runtime: &Arc<AgentRuntime>,
) -> ApiResult<Message> {
	let (_, context) = load_context(account_id, chat_session_id, itinerary_id, pool).await?;

	let tool_ctx = ToolContext {
		map_adapter: &runtime.map_adapter,
		llm: runtime.llm.as_ref(),
		checkpointer: runtime.checkpointer.as_ref(),
		modification_cache: &runtime.modification_cache,
	};
	let agent = ChatAgent::new(runtime.llm.as_ref());
	let turn = agent.handle_turn(text, context.as_ref(), &tool_ctx).await;

	finalize_turn(turn, account_id, chat_session_id, itinerary_id, pool, runtime).await
}

/// Shared tail of a chat turn, used by both the synchronous `/sendMessage`
/// handler and the SSE `/stream` handler once `ChatAgent`'s tool-calling
/// loop has settled: detects `confirm_and_generate_trip`'s trigger
/// sentinel, launches the orchestration graph if present, persists the
/// resulting itinerary, and inserts the bot's reply as a message row.
async fn finalize_turn(
	turn: crate::agent::chat::ChatTurnResult,
	account_id: i32,
	chat_session_id: i32,
	itinerary_id: Option<i32>,
	pool: &PgPool,
	runtime: &Arc<AgentRuntime>,
) -> ApiResult<Message> {
	// `confirm_and_generate_trip` only returns a trigger sentinel (see
	// `tools::TRIGGER_GENERATION_ACTION`); this transport layer is the one
	// that actually launches the orchestration graph on seeing it.
	let trigger = turn.tool_executions.iter().find(|execution| {
		execution.success
			&& execution.tool_name == "confirm_and_generate_trip"
			&& execution.output.get("action").and_then(|a| a.as_str()) == Some(crate::agent::chat::tools::TRIGGER_GENERATION_ACTION)
	});

	let mut pending_thread_id = None;
	let generated_itinerary = match trigger {
		Some(execution) => {
			let form_data: crate::agent::models::user::TripFormState = execution
				.output
				.get("form_data")
				.cloned()
				.and_then(|v| serde_json::from_value(v).ok())
				.ok_or_else(|| AppError::Internal("trigger_generation sentinel missing form_data".to_string()))?;
			let trip = crate::agent::models::trip::TripInput::try_from(form_data).map_err(AppError::Internal)?;
			let thread_id = uuid::Uuid::new_v4().to_string();
			sqlx::query!(
				"INSERT INTO graph_threads (thread_id, account_id, chat_session_id) VALUES ($1, $2, $3)",
				thread_id,
				account_id,
				chat_session_id,
			)
			.execute(pool)
			.await
			.map_err(AppError::from)?;
			let state = crate::agent::graph::run(
				&thread_id,
				trip,
				&runtime.map_adapter,
				runtime.llm.as_ref(),
				runtime.checkpointer.as_ref(),
				runtime.hitl_itinerary_review,
			)
			.await
			.map_err(AppError::Internal)?;
			if state.hitl.awaiting_input {
				pending_thread_id = Some(thread_id);
			}
			state.final_itinerary
		}
		None => None,
	};

	let resulting_itinerary_id = match generated_itinerary {
		Some(itinerary) => Some(persist_itinerary(pool, account_id, chat_session_id, &itinerary).await?),
		None => itinerary_id,
	};

	let record = sqlx::query!(
		r#"
		INSERT INTO messages (chat_session_id, itinerary_id, is_user, timestamp, text)
		VALUES ($1, $2, FALSE, NOW(), $3)
		RETURNING id, timestamp;
		"#,
		chat_session_id,
		resulting_itinerary_id,
		turn.reply,
	)
	.fetch_one(pool)
	.await
	.map_err(AppError::from)?;

	Ok(Message {
		id: record.id,
		is_user: false,
		timestamp: record.timestamp,
		text: turn.reply,
		itinerary_id: resulting_itinerary_id,
		pending_review_thread_id: pending_thread_id,
	})
}

/// Fetch all the chat session ids belonging to the user to made the request
///
/// # Method
/// `GET /api/chat/chats`
///
/// # Responses
/// - `200 OK` - [ChatsResponse] - list of chat session ids
/// - `401 UNAUTHORIZED` - When authentication fails (handled in middleware, public error)
/// - `500 INTERNAL_SERVER_ERROR` - Internal error (private)
#[utoipa::path(
	get,
	path="/chats",
	summary="Fetch user's chat session IDs",
	description="Fetches a list of all chat session IDs belonging to the user.",
	responses(
		(status=200, description="Successfully retrieved chat sessions", body=ChatsResponse, content_type="application/json"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=405, description="Method Not Allowed - Must be GET"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_chats(Extension(user): Extension<AuthUser>, Extension(pool): Extension<PgPool>) -> ApiResult<Json<ChatsResponse>> {
	let rows = sqlx::query_as!(ChatSessionRow, r#"SELECT id, title from chat_sessions WHERE account_id=$1;"#, user.id)
		.fetch_all(&pool)
		.await
		.map_err(AppError::from)?;

	Ok(Json(ChatsResponse {
		chat_sessions: rows.into_iter().map(|row| crate::http_models::chat_session::ChatSessionSummary { id: row.id, title: row.title }).collect(),
	}))
}

/// Get a page of messages from this chat session belonging to the user who made the request
///
/// # Method
/// `POST /api/chat/messagePage`
///
/// # Request Body
/// - [MessagePageRequest]
///
/// # Responses
/// - `200 OK` - with body: [MessagePageResponse]
/// - `400 BAD_REQUEST` - Request payload contains invalid data (public error)
/// - `401 UNAUTHORIZED` - When authentication fails (handled in middleware, public error)
/// - `500 INTERNAL_SERVER_ERROR` - Internal error (private)
#[utoipa::path(
	post,
	path="/messagePage",
	summary="Fetch a page of messages from a chat session",
	description="If no message id is provided, this fetches the latest messages from the chat session. If a message id is provided, that message and messages preceeding it will be fetched.",
	request_body(content=MessagePageRequest, content_type="application/json", description="Message id may be omitted to get the latest messages"),
	responses(
		(status=200, description="Messages retrieved successfully", body=MessagePageResponse, content_type="application/json"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=405, description="Method Not Allowed - Must be POST"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_message_page(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Json(MessagePageRequest { chat_session_id, message_id }): Json<MessagePageRequest>,
) -> ApiResult<Json<MessagePageResponse>> {
	let mut message_page: Vec<Message> = sqlx::query_as!(
		MessageRow,
		r#"
		SELECT
			m.id,
			m.chat_session_id,
			m.itinerary_id,
			m.is_user,
			m.timestamp,
			m.text
		FROM messages m
		INNER JOIN chat_sessions c
		ON m.chat_session_id=c.id
		WHERE
			c.id=$1 AND
			c.account_id=$2 AND
			(
				$3::int IS NULL OR
				m.timestamp <= (SELECT timestamp FROM messages WHERE id=$3)
			)
		ORDER BY m.timestamp DESC
		LIMIT $4 + 1;
		"#,
		chat_session_id,
		user.id,
		message_id,
		MESSAGE_PAGE_LEN
	)
	.fetch_all(&pool)
	.await
	.map_err(AppError::from)?
	.into_iter()
	.rev()
	.map(|msg_row| Message {
		id: msg_row.id,
		is_user: msg_row.is_user,
		timestamp: msg_row.timestamp,
		text: msg_row.text,
		itinerary_id: msg_row.itinerary_id,
		pending_review_thread_id: None,
	})
	.collect();

	let prev_message_id = if message_page.len() == MESSAGE_PAGE_LEN as usize + 1 {
		Some(message_page.remove(0).id)
	} else {
		None
	};

	Ok(Json(MessagePageResponse { message_page, prev_message_id }))
}

/// Update an existing message with new text, and get a message back from the LLM
///
/// # Method
/// `POST /api/chat/updateMessage`
///
/// # Request Body
/// - [UpdateMessageRequest]
///
/// # Responses
/// - `200 OK` - with body: [Message] - message from LLM
/// - `400 BAD_REQUEST` - Request payload contains invalid data (public error)
/// - `401 UNAUTHORIZED` - When authentication fails (handled in middleware, public error)
/// - `404 NOT_FOUND` - The provided message id does not belong to the user or does not exist (public error)
/// - `500 INTERNAL_SERVER_ERROR` - Internal error (private)
#[utoipa::path(
	post,
	path="/updateMessage",
	summary="Update the text of a message and wait for a reply from the LLM",
	description="Updating a message deletes all proceeding messages, updates the text of the given message, and returns a response from the LLM.",
	request_body(content=UpdateMessageRequest, content_type="application/json", description="Itinerary id is optional and is used to give context to the LLM."),
	responses(
		(status=200, description="Message updated, and LLM replied successfully", body=Message, content_type="application/json"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Message not found in this chat session for this user"),
		(status=405, description="Method Not Allowed - Must be POST"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_update_message(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Extension(runtime): Extension<Arc<AgentRuntime>>,
	Json(UpdateMessageRequest { message_id, new_text, itinerary_id }): Json<UpdateMessageRequest>,
) -> ApiResult<Json<Message>> {
	if new_text.is_empty() {
		return Err(AppError::BadRequest(String::from("Text cannot be empty")));
	}

	let message_info = sqlx::query!(
		r#"
		SELECT m.chat_session_id, m.timestamp
		FROM messages m
		INNER JOIN chat_sessions c ON m.chat_session_id = c.id
		WHERE m.id = $1 AND c.account_id = $2 AND m.is_user = TRUE;
		"#,
		message_id,
		user.id
	)
	.fetch_optional(&pool)
	.await
	.map_err(AppError::from)?
	.ok_or(AppError::NotFound)?;

	let chat_session_id = message_info.chat_session_id;
	let message_timestamp = message_info.timestamp;

	sqlx::query!(
		r#"
		DELETE FROM messages
		WHERE chat_session_id = $1
		  AND timestamp > $2
		  AND id != $3;
		"#,
		chat_session_id,
		message_timestamp,
		message_id
	)
	.execute(&pool)
	.await
	.map_err(AppError::from)?;

	sqlx::query!(
		r#"
		UPDATE messages
		SET text = $1, timestamp = NOW()
		WHERE id = $2;
		"#,
		new_text,
		message_id
	)
	.execute(&pool)
	.await
	.map_err(AppError::from)?;

	let bot_message = send_message_to_llm(new_text.as_str(), user.id, chat_session_id, itinerary_id, &pool, &runtime).await?;

	Ok(Json(bot_message))
}

/// Send a new message, and get a message back from the LLM
///
/// # Method
/// `POST /api/chat/sendMessage`
///
/// # Request Body
/// - [SendMessageRequest]
///
/// # Responses
/// - `200 OK` - with body: [SendMessageResponse] - contains message from LLM
/// - `400 BAD_REQUEST` - Request payload contains invalid data (public error)
/// - `401 UNAUTHORIZED` - When authentication fails (handled in middleware, public error)
/// - `404 NOT_FOUND` - The provided chat session id does not belong to the user or does not exist (public error)
/// - `500 INTERNAL_SERVER_ERROR` - Internal error (private)
#[utoipa::path(
	post,
	path="/sendMessage",
	summary="Send a message and wait for a reply from the LLM",
	description="Ask the assistant to update the trip form, generate a plan, or preview/confirm a modification; it replies once its tool-calling loop settles.",
	request_body(content=SendMessageRequest, content_type="application/json", description="Itinerary id is optional and is used to give context to the LLM."),
	responses(
		(status=200, description="Message sent, and LLM replied successfully", body=SendMessageResponse, content_type="application/json"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Chat session not found for this user"),
		(status=405, description="Method Not Allowed - Must be POST"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_send_message(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Extension(runtime): Extension<Arc<AgentRuntime>>,
	Json(SendMessageRequest { chat_session_id, text, itinerary_id }): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
	if text.is_empty() {
		return Err(AppError::BadRequest(String::from("Text cannot be empty")));
	}

	sqlx::query!(r#"SELECT id FROM chat_sessions WHERE id=$1 AND account_id=$2;"#, chat_session_id, user.id)
		.fetch_optional(&pool)
		.await
		.map_err(AppError::from)?
		.ok_or(AppError::NotFound)?;

	let user_message_id = sqlx::query!(
		r#"
		INSERT INTO messages (chat_session_id, itinerary_id, is_user, timestamp, text)
		VALUES ($1, NULL, TRUE, NOW(), $2)
		RETURNING id;
		"#,
		chat_session_id,
		text
	)
	.fetch_one(&pool)
	.await
	.map_err(AppError::from)?
	.id;

	let bot_message = send_message_to_llm(text.as_str(), user.id, chat_session_id, itinerary_id, &pool, &runtime).await?;

	Ok(Json(SendMessageResponse { user_message_id, bot_message }))
}

/// Renders one `ChatStreamEvent` as an SSE [Event], naming it after the
/// event's own tag so clients can `addEventListener` per type instead of
/// switching on a generic `message` event.
fn sse_event(event: &ChatStreamEvent) -> Event {
	let name = match event {
		ChatStreamEvent::Start { .. } => "start",
		ChatStreamEvent::Delta { .. } => "delta",
		ChatStreamEvent::ToolCall { .. } => "tool_call",
		ChatStreamEvent::ToolResult { .. } => "tool_result",
		ChatStreamEvent::End { .. } => "end",
		ChatStreamEvent::Error { .. } => "error",
	};
	match Event::default().event(name).json_data(event) {
		Ok(built) => built,
		Err(_) => Event::default().event("error").data("{\"message\":\"failed to serialize event\"}"),
	}
}

/// Send a new message and stream the LLM's reply over SSE.
///
/// # Method
/// `POST /api/chat/stream`
///
/// # Request Body
/// - [SendMessageRequest]
///
/// # Responses
/// - `200 OK` - `text/event-stream` - `start`, `delta`, `tool_call`, `tool_result`, `end`, and `error` events, one per line
/// - `400 BAD_REQUEST` - Request payload contains invalid data (public error)
/// - `401 UNAUTHORIZED` - When authentication fails (handled in middleware, public error)
/// - `404 NOT_FOUND` - The provided chat session id does not belong to the user or does not exist (public error)
#[utoipa::path(
	post,
	path="/stream",
	summary="Send a message and stream the LLM's reply over SSE",
	description="Same tool-calling loop as /sendMessage, but streams token deltas and tool_call/tool_result events as they happen instead of waiting for the turn to settle.",
	request_body(content=SendMessageRequest, content_type="application/json", description="Itinerary id is optional and is used to give context to the LLM."),
	responses(
		(status=200, description="SSE stream of start/delta/tool_call/tool_result/end/error events", content_type="text/event-stream"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Chat session not found for this user"),
		(status=405, description="Method Not Allowed - Must be POST"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_send_message_stream(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Extension(runtime): Extension<Arc<AgentRuntime>>,
	Json(SendMessageRequest { chat_session_id, text, itinerary_id }): Json<SendMessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
	if text.is_empty() {
		return Err(AppError::BadRequest(String::from("Text cannot be empty")));
	}

	sqlx::query!(r#"SELECT id FROM chat_sessions WHERE id=$1 AND account_id=$2;"#, chat_session_id, user.id)
		.fetch_optional(&pool)
		.await
		.map_err(AppError::from)?
		.ok_or(AppError::NotFound)?;

	sqlx::query!(
		r#"
		INSERT INTO messages (chat_session_id, itinerary_id, is_user, timestamp, text)
		VALUES ($1, NULL, TRUE, NOW(), $2)
		RETURNING id;
		"#,
		chat_session_id,
		text
	)
	.fetch_one(&pool)
	.await
	.map_err(AppError::from)?;

	let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<ChatStreamEvent>();
	let account_id = user.id;
	let session_id_str = chat_session_id.to_string();
	let message_id_str = uuid::Uuid::new_v4().to_string();

	tokio::spawn(async move {
		let (_, context) = match load_context(account_id, chat_session_id, itinerary_id, &pool).await {
			Ok(ctx) => ctx,
			Err(_) => (None, None),
		};
		let tool_ctx = ToolContext {
			map_adapter: &runtime.map_adapter,
			llm: runtime.llm.as_ref(),
			checkpointer: runtime.checkpointer.as_ref(),
			modification_cache: &runtime.modification_cache,
		};
		let agent = ChatAgent::new(runtime.llm.as_ref());
		let emit_tx = tx.clone();
		let turn = agent
			.handle_turn_streaming(&text, context.as_ref(), &tool_ctx, &session_id_str, &message_id_str, |event| {
				let _ = emit_tx.send(event);
			})
			.await;

		if let Err(e) = finalize_turn(turn, account_id, chat_session_id, itinerary_id, &pool, &runtime).await {
			let _ = tx.send(ChatStreamEvent::Error { message: format!("{e:?}"), timestamp_ms: chrono::Utc::now().timestamp_millis() });
		}
	});

	let body = UnboundedReceiverStream::new(rx).map(|event| Ok(sse_event(&event)));
	Ok(Sse::new(body).keep_alive(KeepAlive::default()))
}

/// Resume a trip-planning run suspended on a HITL interrupt.
///
/// # Method
/// `POST /api/chat/resume`
///
/// # Request Body
/// - [ResumeRequest]
///
/// # Responses
/// - `200 OK` - with body: [ResumeResponse]
/// - `400 BAD_REQUEST` - Malformed decision payload (public error)
/// - `401 UNAUTHORIZED` - When authentication fails, or the thread belongs to another account (public error)
/// - `404 NOT_FOUND` - No such thread, or it has no checkpoint (public error)
/// - `500 INTERNAL_SERVER_ERROR` - Internal error (private)
#[utoipa::path(
	post,
	path="/resume",
	summary="Resume a suspended itinerary_review or budget_decision interrupt",
	description="Supplies the traveler's decision for a HITL-suspended orchestration run and continues it; persists the resulting itinerary if the run reaches finalize.",
	request_body(content=ResumeRequest, content_type="application/json"),
	responses(
		(status=200, description="Run resumed", body=ResumeResponse, content_type="application/json"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie, or does not own this thread"),
		(status=404, description="No such thread"),
		(status=405, description="Method Not Allowed - Must be POST"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_resume(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Extension(runtime): Extension<Arc<AgentRuntime>>,
	Json(ResumeRequest { thread_id, decision }): Json<ResumeRequest>,
) -> ApiResult<Json<ResumeResponse>> {
	let thread = sqlx::query!("SELECT account_id, chat_session_id FROM graph_threads WHERE thread_id = $1", thread_id)
		.fetch_optional(&pool)
		.await
		.map_err(AppError::from)?
		.ok_or(AppError::NotFound)?;
	if thread.account_id != user.id {
		return Err(AppError::Unauthorized);
	}

	let state = crate::agent::graph::resume(&thread_id, decision, &runtime.map_adapter, runtime.llm.as_ref(), runtime.checkpointer.as_ref())
		.await
		.map_err(AppError::Internal)?;

	let itinerary_id = match state.final_itinerary {
		Some(itinerary) => Some(persist_itinerary(&pool, thread.account_id, thread.chat_session_id, &itinerary).await?),
		None => None,
	};

	Ok(Json(ResumeResponse { awaiting_input: state.hitl.awaiting_input, itinerary_id }))
}

/// Get an empty chat session id belonging to this user, or create one if one doesn't exist
///
/// # Method
/// `GET /api/chat/newChat`
#[utoipa::path(
	get,
	path="/newChat",
	summary="Get the chat session id for an empty chat",
	description="Creates a new empty chat session for this user if one doesn't already exist, and returns its chat session id.",
	responses(
		(status=200, description="New chat session retrieved successfully", body=NewChatResponse, content_type="application/json"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=405, description="Method Not Allowed - Must be GET"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_new_chat(Extension(user): Extension<AuthUser>, Extension(pool): Extension<PgPool>) -> ApiResult<Json<NewChatResponse>> {
	let chat_sessions = sqlx::query!(
		r#"
		SELECT c.id
		FROM chat_sessions c
		WHERE
			c.account_id=$1
			AND NOT EXISTS (
				SELECT 1
				FROM messages m
				WHERE m.chat_session_id=c.id
			);
		"#,
		user.id
	)
	.fetch_all(&pool)
	.await
	.map_err(AppError::from)?;

	let chat_session_id = match chat_sessions.first() {
		Some(record) => record.id,
		None => {
			sqlx::query!(
				r#"
				INSERT INTO chat_sessions (account_id, title)
				VALUES ($1, 'New Chat')
				RETURNING id
				"#,
				user.id
			)
			.fetch_one(&pool)
			.await
			.map_err(AppError::from)?
			.id
		}
	};

	Ok(Json(NewChatResponse { chat_session_id }))
}

/// Delete the chat session with the given ID
///
/// # Method
/// `DELETE /api/chat/:id`
#[utoipa::path(
	delete,
	path="/{id}",
	summary="Delete the given chat session",
	description="Deletes a chat session and its associated messages and unsaved, private itineraries if it belongs to the user making the request.",
	responses(
		(status=200, description="Chat session and associated messages and unsaved, private itineraries deleted successfully"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Chat session not found for this user"),
		(status=405, description="Method Not Allowed - Must be DELETE"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_delete_chat(Extension(user): Extension<AuthUser>, Extension(pool): Extension<PgPool>, Path(chat_session_id): Path<i32>) -> ApiResult<()> {
	sqlx::query!(
		r#"
		DELETE FROM itineraries
		WHERE
			chat_session_id=$1 AND
			account_id=$2 AND
			is_public=FALSE AND
			saved=FALSE;
		"#,
		chat_session_id,
		user.id
	)
	.execute(&pool)
	.await
	.map_err(AppError::from)?;

	sqlx::query!(
		r#"
		DELETE FROM chat_sessions
		WHERE id=$1 AND account_id=$2
		RETURNING id;
		"#,
		chat_session_id,
		user.id
	)
	.fetch_optional(&pool)
	.await
	.map_err(AppError::from)?
	.ok_or(AppError::NotFound)?;

	Ok(())
}

/// Rename a chat session
///
/// # Method
/// `POST /api/chat/rename`
#[utoipa::path(
	post,
	path="/rename",
	summary="Rename a chat session",
	description="Renames a chat session that belongs to this user with the given ID to the given title.",
	request_body(content=RenameRequest, content_type="application/json", description="Chat session ID must belong to the user who sent the request. New Title must not be empty string."),
	responses(
		(status=200, description="Chat renamed successfully"),
		(status=400, description="Bad Request"),
		(status=401, description="User has an invalid cookie/no cookie"),
		(status=404, description="Chat session not found for this user"),
		(status=405, description="Method Not Allowed - Must be POST"),
		(status=408, description="Request Timed Out"),
		(status=500, description="Internal Server Error")
	),
	security(("set-cookie"=[])),
	tag="Chat"
)]
pub async fn api_rename(
	Extension(user): Extension<AuthUser>,
	Extension(pool): Extension<PgPool>,
	Json(RenameRequest { new_title, id }): Json<RenameRequest>,
) -> ApiResult<()> {
	if new_title.is_empty() {
		return Err(AppError::BadRequest(String::from("New title must not be empty")));
	}

	sqlx::query!(r#"SELECT id from chat_sessions WHERE id=$1 AND account_id=$2"#, id, user.id)
		.fetch_optional(&pool)
		.await
		.map_err(AppError::from)?
		.ok_or(AppError::NotFound)?;

	sqlx::query!(r#"UPDATE chat_sessions SET title=$1 WHERE id=$2"#, new_title, id)
		.execute(&pool)
		.await
		.map_err(AppError::from)?;

	Ok(())
}

/// Create the chat routes with authentication middleware.
///
/// # Routes
/// - `GET /chats` - Get metadata for all the user's chat sessions (protected)
/// - `POST /messagePage` - Gets a page of messages in the session, ending with message_id or the latest message (protected)
/// - `POST /updateMessage` - Updates a user's message and waits for a bot reply (protected)
/// - `POST /sendMessage` - Sends a user's message and waits for a bot reply (protected)
/// - `POST /stream` - Sends a user's message and streams the reply over SSE (protected)
/// - `POST /resume` - Resumes a HITL-suspended trip-planning run (protected)
/// - `GET /newChat` - Gets a chat session id for an empty chat (protected)
/// - `DELETE /:id` - Delete a chat session and associated messages (protected)
/// - `POST /rename` - Renames the title of a chat session (protected)
///
/// # Middleware
/// All routes are protected by `auth_middleware` which validates the `auth-token` cookie.
pub fn chat_routes() -> AxumRouter {
	AxumRouter::new()
		.route("/chats", get(api_chats))
		.route("/messagePage", post(api_message_page))
		.route("/updateMessage", post(api_update_message))
		.route("/sendMessage", post(api_send_message))
		.route("/stream", post(api_send_message_stream))
		.route("/resume", post(api_resume))
		.route("/newChat", get(api_new_chat))
		.route("/{id}", delete(api_delete_chat))
		.route("/rename", post(api_rename))
		.route_layer(axum::middleware::from_fn(auth_middleware))
}
