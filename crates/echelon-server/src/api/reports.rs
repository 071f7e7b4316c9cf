//! CSV report downloads.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use echelon_core::report::{write_detail_csv, write_ranking_csv};

use crate::error::ApiResult;
use crate::AppState;

/// File name of the ranking download.
pub const RANKING_FILE: &str = "rank_report.csv";
/// File name of the detail download.
pub const DETAIL_FILE: &str = "detail_report.csv";

fn csv_download(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Ranking report as a CSV attachment.
///
/// # Endpoint
///
/// `GET /report`
pub async fn ranking_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = state.echelon.ranking_report()?;
    let mut body = Vec::new();
    write_ranking_csv(&rows, &mut body, b',')?;
    Ok(csv_download(RANKING_FILE, body))
}

/// Detail report (one row per match) as a CSV attachment.
///
/// # Endpoint
///
/// `GET /detail`
pub async fn detail_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = state.echelon.detail_report()?;
    let mut body = Vec::new();
    write_detail_csv(&rows, &mut body, b',')?;
    Ok(csv_download(DETAIL_FILE, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use echelon_core::ItemRef;

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn disposition(response: &Response) -> String {
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .expect("Should have Content-Disposition header")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_ranking_csv_download() {
        let state = state_with(&["a.png", "b.jpg"]);
        state
            .echelon
            .record_outcome(&ItemRef::Name("a.png".into()), &ItemRef::Name("b.jpg".into()))
            .unwrap();

        let response = ranking_csv(State(state)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert_eq!(
            disposition(&response),
            "attachment; filename=\"rank_report.csv\""
        );

        let text = body_text(response).await;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "image,rating,matches,wins,losses",
                "a.png,1216,1,1,0",
                "b.jpg,1184,1,0,1",
            ]
        );
    }

    #[tokio::test]
    async fn test_detail_csv_download() {
        let state = state_with(&["a.png", "b.jpg"]);
        state
            .echelon
            .record_outcome(&ItemRef::Id(2), &ItemRef::Id(1))
            .unwrap();

        let response = detail_csv(State(state)).await.unwrap();
        assert!(disposition(&response).contains("detail_report.csv"));

        let text = body_text(response).await;
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("match_number,winner_name,winner_rating,loser_name,loser_rating,match_time")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,b.jpg,1216,a.png,1184,"));
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn test_detail_csv_empty_ledger() {
        let state = state_with(&["a.png"]);
        let text = body_text(detail_csv(State(state)).await.unwrap()).await;
        assert_eq!(text.lines().count(), 1);
    }
}
