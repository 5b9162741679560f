// WebSocket handlers: connect = subscribe, disconnect = unsubscribe

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::TrafficRecord;
use crate::monitor::ChannelKind;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the ws connection count on drop (connect = +1, drop = -1).
struct WsConnGuard(Arc<AtomicUsize>);

impl Drop for WsConnGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_speed(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_records(socket, state, ChannelKind::Speed).await {
            tracing::info!("speed stream error: {}", e);
        }
    })
}

pub(super) async fn ws_stats(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_records(socket, state, ChannelKind::Statistics).await {
            tracing::info!("statistics stream error: {}", e);
        }
    })
}

/// Subscribe, pump records until the socket dies or the session ends,
/// then unsubscribe. A new subscriber on the same channel displaces this
/// one: the record channel closes and the loop ends.
async fn stream_records(
    mut socket: WebSocket,
    state: AppState,
    kind: ChannelKind,
) -> anyhow::Result<()> {
    state
        .ws_connections
        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsConnGuard(state.ws_connections.clone());
    tracing::info!(channel = ?kind, "subscriber connected");

    let (token, mut rx) = state.emitter.start(kind)?;
    let result = pump_records(&mut socket, &mut rx).await;
    state.emitter.stop(token);
    tracing::info!(channel = ?kind, "subscriber disconnected");
    result
}

async fn pump_records(
    socket: &mut WebSocket,
    rx: &mut mpsc::Receiver<TrafficRecord>,
) -> anyhow::Result<()> {
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            record = rx.recv() => {
                match record {
                    Some(record) => {
                        let json = serde_json::to_string(&record)?;
                        let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                            break;
                        }
                    }
                    // session displaced or stopped
                    None => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
