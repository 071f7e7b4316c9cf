//! Outcome recording handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use echelon_core::{ItemRef, OutcomeSummary};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::ws::WsMessage;
use crate::AppState;

/// Request body of `POST /api/outcome`.
///
/// Each side is `{"id": n}` or `{"name": "file.png"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRequest {
    /// Preferred item.
    pub winner: ItemRef,
    /// The other item.
    pub loser: ItemRef,
}

/// Record a decided comparison.
///
/// # Endpoint
///
/// `POST /api/outcome`
///
/// # Response
///
/// - `200 OK`: the match id and both updated items
/// - `400 Bad Request`: winner and loser are the same item
/// - `404 Not Found`: either item is unknown
pub async fn record_outcome(
    State(state): State<AppState>,
    Json(request): Json<OutcomeRequest>,
) -> ApiResult<Json<OutcomeSummary>> {
    apply(&state, &request.winner, &request.loser).map(Json)
}

/// Path form kept for old front-ends: `GET /update/winner=<name>;loser=<name>`.
pub async fn legacy_update(
    State(state): State<AppState>,
    Path(decision): Path<String>,
) -> ApiResult<Json<OutcomeSummary>> {
    let (winner, loser) = parse_legacy(&decision)?;
    apply(&state, &ItemRef::Name(winner), &ItemRef::Name(loser)).map(Json)
}

fn apply(state: &AppState, winner: &ItemRef, loser: &ItemRef) -> ApiResult<OutcomeSummary> {
    let summary = state.echelon.record_outcome(winner, loser)?;
    // No connected client is not a failure.
    let _ = state.ws_broadcast.send(WsMessage::from(&summary));
    Ok(summary)
}

/// Split `winner=<a>;loser=<b>` into its two names.
pub fn parse_legacy(decision: &str) -> Result<(String, String), ApiError> {
    let malformed = || {
        ApiError::BadRequest(format!(
            "expected winner=<name>;loser=<name>, got '{}'",
            decision
        ))
    };

    let rest = decision.strip_prefix("winner=").ok_or_else(malformed)?;
    let (winner, loser) = rest.rsplit_once(";loser=").ok_or_else(malformed)?;
    if winner.is_empty() || loser.is_empty() {
        return Err(malformed());
    }
    Ok((winner.to_string(), loser.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with;
    use echelon_core::EchelonError;

    #[test]
    fn test_parse_legacy() {
        assert_eq!(
            parse_legacy("winner=a.png;loser=b.jpg").unwrap(),
            ("a.png".to_string(), "b.jpg".to_string())
        );
        assert_eq!(
            parse_legacy("winner=x;y.png;loser=z.png").unwrap(),
            ("x;y.png".to_string(), "z.png".to_string())
        );
        assert!(parse_legacy("loser=b.jpg;winner=a.png").is_err());
        assert!(parse_legacy("winner=a.png").is_err());
        assert!(parse_legacy("winner=;loser=b.jpg").is_err());
    }

    #[test]
    fn test_request_accepts_ids_and_names() {
        let request: OutcomeRequest =
            serde_json::from_str(r#"{"winner":{"id":1},"loser":{"name":"b.jpg"}}"#).unwrap();
        assert_eq!(request.winner, ItemRef::Id(1));
        assert_eq!(request.loser, ItemRef::Name("b.jpg".into()));
    }

    #[tokio::test]
    async fn test_record_outcome_updates_both_items() {
        let state = state_with(&["a.png", "b.jpg"]);
        let request = OutcomeRequest {
            winner: ItemRef::Name("a.png".into()),
            loser: ItemRef::Id(2),
        };

        let Json(summary) = record_outcome(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert_eq!(summary.match_id, 1);
        assert!((summary.winner.rating - 1216.0).abs() < 1e-9);
        assert!((summary.loser.rating - 1184.0).abs() < 1e-9);
        assert_eq!(summary.winner.id, 1);
        assert_eq!(summary.loser.id, 2);
        assert!(!summary.winner.updated.is_empty());
    }

    #[tokio::test]
    async fn test_record_outcome_broadcasts() {
        let state = state_with(&["a.png", "b.jpg"]);
        let mut rx = state.ws_broadcast.subscribe();

        legacy_update(
            State(state.clone()),
            Path("winner=b.jpg;loser=a.png".to_string()),
        )
        .await
        .unwrap();

        let WsMessage::OutcomeRecorded {
            match_id, winner, ..
        } = rx.recv().await.unwrap();
        assert_eq!(match_id, 1);
        assert_eq!(winner, "b.jpg");
    }

    #[tokio::test]
    async fn test_record_outcome_errors() {
        let state = state_with(&["a.png", "b.jpg"]);

        let same = OutcomeRequest {
            winner: ItemRef::Id(1),
            loser: ItemRef::Name("a.png".into()),
        };
        let result = record_outcome(State(state.clone()), Json(same)).await;
        assert!(matches!(
            result,
            Err(ApiError::Echelon(EchelonError::InvalidOutcome(_)))
        ));

        let unknown = OutcomeRequest {
            winner: ItemRef::Id(1),
            loser: ItemRef::Id(99),
        };
        let result = record_outcome(State(state.clone()), Json(unknown)).await;
        assert!(matches!(
            result,
            Err(ApiError::Echelon(EchelonError::NotFound(ItemRef::Id(99))))
        ));

        let malformed = legacy_update(State(state.clone()), Path("nonsense".into())).await;
        assert!(matches!(malformed, Err(ApiError::BadRequest(_))));

        assert_eq!(state.echelon.ledger().count().unwrap(), 0);
    }
}
