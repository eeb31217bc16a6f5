//! `/ws/incidents`: live lifecycle stream over WebSocket.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{close_code, CloseFrame, Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use incident_core::{ChannelObserver, IncidentStore};

use crate::state::AppState;

/// Close reason sent when the observer is dropped for falling behind.
pub const EVICTED_REASON: &str = "observer dropped";

pub async fn ws_handler<S: IncidentStore + 'static>(
  State(state): State<Arc<AppState<S>>>,
  ws: WebSocketUpgrade,
) -> impl IntoResponse {
  ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs after the upgrade handshake, so the observer is only registered
/// once the connection can actually carry frames.
async fn handle_socket<S: IncidentStore>(socket: WebSocket, state: Arc<AppState<S>>) {
  let (mut sender, mut receiver) = socket.split();
  let broadcaster = state.service.broadcaster().clone();

  let (observer, mut rx) = ChannelObserver::channel(state.service.config().observer_buffer);
  let handle = broadcaster.subscribe(observer).await;

  // Drain this observer's queue into the socket; order is preserved.
  let mut send_task = tokio::spawn(async move {
    while let Some(frame) = rx.recv().await {
      if sender.send(Message::Text(frame)).await.is_err() {
        return;
      }
    }
    // Queue closed: the broadcaster dropped this observer.
    let _ = sender
      .send(Message::Close(Some(CloseFrame {
        code: close_code::AGAIN,
        reason: EVICTED_REASON.into(),
      })))
      .await;
  });

  // Inbound frames carry nothing; read only to notice the close.
  loop {
    tokio::select! {
      _ = &mut send_task => break,
      msg = receiver.next() => match msg {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
        Some(Ok(_)) => {}
      },
    }
  }

  send_task.abort();
  broadcaster.unsubscribe(handle).await;
  tracing::debug!(observer = %handle, "websocket closed");
}
