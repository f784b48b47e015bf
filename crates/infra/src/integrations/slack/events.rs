//! Inbound Slack Events API webhook.
//!
//! Slack posts JSON to `/slack/events`. Two payloads matter here: the
//! one-time `url_verification` handshake, answered by echoing the
//! challenge, and `event_callback` message events, which are forwarded to
//! the scheduler as [`InboundEvent`]s. Bot-authored messages are dropped
//! so the daemon never reacts to its own DMs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A user-authored message received over the Events API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventsPayload {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event: InnerEvent,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct InnerEvent {
    #[serde(rename = "type")]
    kind: String,
    user: Option<String>,
    text: Option<String>,
    bot_id: Option<String>,
}

#[derive(Clone)]
struct EventsState {
    tx: mpsc::Sender<InboundEvent>,
}

/// Build the webhook router. Received messages are forwarded on `tx`.
pub fn events_router(tx: mpsc::Sender<InboundEvent>) -> Router {
    Router::new()
        .route("/slack/events", post(handle_events))
        .with_state(EventsState { tx })
}

async fn handle_events(
    State(state): State<EventsState>,
    Json(payload): Json<EventsPayload>,
) -> Response {
    match payload {
        EventsPayload::UrlVerification { challenge } => {
            debug!("answering slack url verification");
            Json(json!({ "challenge": challenge })).into_response()
        }
        EventsPayload::EventCallback { event } => {
            if event.kind == "message" && event.bot_id.is_none() {
                if let (Some(user), Some(text)) = (event.user, event.text) {
                    let inbound = InboundEvent {
                        sender_id: user,
                        text,
                    };
                    if state.tx.send(inbound).await.is_err() {
                        warn!("inbound event channel closed, dropping message");
                    }
                }
            }
            StatusCode::OK.into_response()
        }
        EventsPayload::Other => StatusCode::OK.into_response(),
    }
}
