//! Chat routes: multilingual relay to the hosted LLM.

use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info_span, Instrument, Span};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use doki_chat::framing::{BODY_CONTENT_TYPE, GENERIC_STREAM_ERROR};
use doki_chat::language::supported_languages;
use doki_chat::providers::{BoxedStream, StreamChunk};
use doki_chat::{ChatRequest, ChatStatus, Language, LanguagesResponse, StreamFormat};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        // Conversations are relayed whole, however long.
        .route("/chat", post(chat).layer(DefaultBodyLimit::disable()))
        .route("/chat/status", get(get_status))
        .route("/chat/languages", get(get_languages))
}

// ---------------------------------------------------------------
// Relay
// ---------------------------------------------------------------

/// POST /api/chat: stream a completion for `{messages, language?}`.
async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let language = Language::resolve(req.language.as_deref());
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, %language);

    let upstream = state
        .relay
        .relay(language, &req.messages)
        .instrument(span.clone())
        .await
        .map_err(|e| {
            span.in_scope(|| error!("Chat API error: {}", e));
            ApiError::Internal
        })?;

    let format = state.relay.stream_format();
    let message_id = format!("msg-{}", request_id.simple());
    let body = Body::from_stream(encode_stream(upstream, format, message_id, span));

    Ok((StatusCode::OK, stream_headers(format), body))
}

fn stream_headers(format: StreamFormat) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(BODY_CONTENT_TYPE));
    if let Some((name, value)) = format.protocol_header() {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Frame provider chunks for the response body, in arrival order.
///
/// A mid-stream failure in text framing yields an `Err`, which aborts the
/// chunked body instead of ending it cleanly. Data-stream framing writes its
/// error part and ends.
fn encode_stream(
    upstream: BoxedStream,
    format: StreamFormat,
    message_id: String,
    span: Span,
) -> impl Stream<Item = Result<String, io::Error>> + Send + 'static {
    async_stream::stream! {
        if let Some(start) = format.start(&message_id) {
            yield Ok::<_, io::Error>(start);
        }

        let mut upstream = upstream;
        while let Some(chunk) = upstream.next().await {
            match &chunk {
                StreamChunk::Token(_) => {}
                StreamChunk::Done { finish_reason, usage } => {
                    span.in_scope(|| debug!(?finish_reason, ?usage, "Chat stream complete"));
                }
                StreamChunk::Error(e) => {
                    span.in_scope(|| error!("Chat stream error: {}", e));
                    if format == StreamFormat::Text {
                        yield Err(io::Error::other(GENERIC_STREAM_ERROR));
                        return;
                    }
                }
            }
            if let Some(encoded) = format.encode(&chunk) {
                yield Ok(encoded);
            }
        }
    }
}

// ---------------------------------------------------------------
// Status
// ---------------------------------------------------------------

/// GET /api/chat/status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<ChatStatus> {
    Json(state.relay.status())
}

/// GET /api/chat/languages
async fn get_languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: supported_languages(),
        default: Language::default().code(),
    })
}
