//! WebSocket upgrade + message loop. One connection is one tab.
//!
//! Client messages are handled in order; replies, debounced search results and
//! session changes all go out through the tab's outbound queue, which a writer
//! task drains into the socket.

use std::sync::Arc;
use std::time::Duration;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::logic::{handle_client_ws, session_event_messages, session_status, Tab};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;

/// How long a closing connection waits for queued replies to reach the socket.
const WRITER_GRACE: Duration = Duration::from_secs(1);

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "skillshelf", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
  info!(target: "skillshelf", "WebSocket connected");
  let (mut sink, mut stream) = socket.split();
  let (tx, mut rx) = mpsc::unbounded_channel::<ServerWsMessage>();

  let writer = tokio::spawn(async move {
    while let Some(msg) = rx.recv().await {
      let out = serde_json::to_string(&msg).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
      });
      if let Err(e) = sink.send(Message::Text(out)).await {
        error!(target: "skillshelf", error = %e, "WS send error");
        break;
      }
    }
  });

  // Session changes made by any tab (sign-in, sign-out, a 401) reach this one.
  let mut events = state.backend.subscribe();
  let ev_tx = tx.clone();
  let forwarder = tokio::spawn(async move {
    loop {
      match events.recv().await {
        Ok(ev) => {
          debug!(target: "session", ?ev, "Forwarding session event");
          for m in session_event_messages(&ev) {
            if ev_tx.send(m).is_err() {
              return;
            }
          }
        }
        Err(RecvError::Lagged(n)) => warn!(target: "session", skipped = n, "Session events lagged"),
        Err(RecvError::Closed) => return,
      }
    }
  });

  let mut tab = Tab::new(&state, tx.clone());
  let _ = tx.send(session_status(&state).await);

  'read: while let Some(Ok(msg)) = stream.next().await {
    match msg {
      Message::Text(txt) => {
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "skillshelf", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut tab).await
          }
          Err(e) => {
            warn!(target: "skillshelf", error = %e, text = %trunc_for_log(&txt, 120), "Unparseable WS message");
            vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }]
          }
        };
        for reply in replies {
          if tx.send(reply).is_err() {
            break 'read;
          }
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }

  forwarder.abort();
  drop(tab);
  drop(tx);
  drain_writer(writer, WRITER_GRACE).await;
  info!(target: "skillshelf", "WebSocket disconnected");
}

/// Let the writer flush what is already queued. A debounced search still in
/// flight keeps a sender alive, so the wait is bounded by `grace`.
async fn drain_writer(mut writer: JoinHandle<()>, grace: Duration) -> bool {
  match tokio::time::timeout(grace, &mut writer).await {
    Ok(_) => true,
    Err(_) => {
      warn!(target: "skillshelf", "Outbound queue not drained in time; dropping the rest");
      writer.abort();
      false
    }
  }
}
