//! WebSocket feed of recorded outcomes.
//!
//! Every outcome recorded through the HTTP API is pushed to all connected
//! clients, so open ranking views can refresh without polling.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use echelon_core::OutcomeSummary;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

/// Messages pushed to WebSocket clients.
///
/// Serialized with a snake_case `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// A comparison was decided and both ratings moved.
    OutcomeRecorded {
        /// Ledger id of the match.
        match_id: i64,
        /// Winner name.
        winner: String,
        /// Winner rating after the match.
        winner_rating: f64,
        /// Loser name.
        loser: String,
        /// Loser rating after the match.
        loser_rating: f64,
    },
}

impl From<&OutcomeSummary> for WsMessage {
    fn from(summary: &OutcomeSummary) -> Self {
        WsMessage::OutcomeRecorded {
            match_id: summary.match_id,
            winner: summary.winner.name.clone(),
            winner_rating: summary.winner.rating,
            loser: summary.loser.name.clone(),
            loser_rating: summary.loser.rating,
        }
    }
}

/// Broadcast channel sender for WebSocket messages.
pub type WsBroadcast = broadcast::Sender<WsMessage>;

/// Creates the broadcast channel. Slow clients lose messages past 100.
pub fn create_broadcast() -> WsBroadcast {
    let (tx, _) = broadcast::channel(100);
    tx
}

/// Upgrades `GET /ws` to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(broadcast): State<WsBroadcast>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, broadcast))
}

async fn handle_socket(socket: WebSocket, broadcast: WsBroadcast) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = broadcast.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "WebSocket client lagging");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "Failed to encode WebSocket message");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // The feed is one-way; drain client frames until it disconnects.
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    send_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use echelon_core::OutcomeSide;

    fn side(id: i64, name: &str, rating: f64) -> OutcomeSide {
        OutcomeSide {
            id,
            name: name.to_string(),
            rating_before: 1200.0,
            rating,
            wins: 0,
            losses: 0,
            updated: "2025-01-21 10:00:00.000000".to_string(),
        }
    }

    #[test]
    fn test_outcome_recorded_serialization() {
        let msg = WsMessage::OutcomeRecorded {
            match_id: 4,
            winner: "a.png".to_string(),
            winner_rating: 1216.0,
            loser: "b.jpg".to_string(),
            loser_rating: 1184.0,
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"outcome_recorded\""));
        assert!(json.contains("\"match_id\":4"));
        assert!(json.contains("\"winner\":\"a.png\""));
        assert!(json.contains("\"loser_rating\":1184.0"));

        let back: WsMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_message_from_summary() {
        let summary = OutcomeSummary {
            match_id: 9,
            k: 32.0,
            winner: side(1, "a.png", 1216.0),
            loser: side(2, "b.jpg", 1184.0),
        };

        match WsMessage::from(&summary) {
            WsMessage::OutcomeRecorded {
                match_id,
                winner,
                loser_rating,
                ..
            } => {
                assert_eq!(match_id, 9);
                assert_eq!(winner, "a.png");
                assert_eq!(loser_rating, 1184.0);
            }
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let tx = create_broadcast();
        let mut rx = tx.subscribe();
        let msg = WsMessage::OutcomeRecorded {
            match_id: 1,
            winner: "a".into(),
            winner_rating: 1.0,
            loser: "b".into(),
            loser_rating: 0.0,
        };

        tx.send(msg.clone()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), msg);
    }
}
