//! The live-update channel: a websocket at the service root that forwards
//! broadcast events to the connected observer.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;

use crate::http::state::AppState;

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut observer = state.broadcaster.subscribe();
    tracing::debug!(
        observers = state.broadcaster.observer_count(),
        "observer connected"
    );

    let hello = serde_json::json!({
        "type": "connected",
        "session_id": state.session_id,
    });
    if socket.send(Message::Text(hello.to_string())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            ev = observer.recv() => match ev {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    // A failed send means the observer is gone; dropping it
                    // here must never affect other observers or the run.
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "slow observer missed events");
                }
                Err(RecvError::Closed) => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Inbound frames are ignored; the channel is
                    // server-push only.
                }
                Some(Err(_)) => break,
            },
        }
    }

    tracing::debug!("observer disconnected");
}
