//! HTTP client for the coaching backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{
    DescribePlanRequest, Drill, ExplainMoveRequest, FocusSummary, Milestone, MoveExplanation,
    PlanDescription, ReflectionNote, SyncStatus,
};

/// Data operations the session layer needs from the backend. `CoachClient`
/// is the HTTP implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait CoachBackend: Send + Sync {
    async fn fetch_focus(&self, game_id: &str) -> Result<FocusSummary, ClientError>;

    async fn fetch_milestones(&self, game_id: &str) -> Result<Vec<Milestone>, ClientError>;

    async fn fetch_drills(&self, game_id: &str) -> Result<Vec<Drill>, ClientError>;

    async fn explain_move(&self, req: &ExplainMoveRequest)
        -> Result<MoveExplanation, ClientError>;

    async fn describe_plan(&self, req: &DescribePlanRequest)
        -> Result<PlanDescription, ClientError>;

    async fn save_reflection(
        &self,
        game_id: &str,
        note: &ReflectionNote,
    ) -> Result<(), ClientError>;

    async fn sync_status(&self) -> Result<SyncStatus, ClientError>;
}

pub struct CoachClient {
    client: Client,
    base_url: String,
}

impl CoachClient {
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .user_agent("ChessCoach/1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
        let resp = Self::check_status(resp).await?;
        Ok(resp.json().await?)
    }

    async fn check_status(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        // Error responses carry {"detail": message}.
        let detail = match resp.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("detail")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => "unknown error".to_string(),
        };
        Err(ClientError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl CoachBackend for CoachClient {
    async fn fetch_focus(&self, game_id: &str) -> Result<FocusSummary, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/api/coach/games/{game_id}/focus")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn fetch_milestones(&self, game_id: &str) -> Result<Vec<Milestone>, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/api/coach/games/{game_id}/milestones")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn fetch_drills(&self, game_id: &str) -> Result<Vec<Drill>, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/api/coach/games/{game_id}/drills")))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn explain_move(
        &self,
        req: &ExplainMoveRequest,
    ) -> Result<MoveExplanation, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/coach/explain-move"))
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn describe_plan(
        &self,
        req: &DescribePlanRequest,
    ) -> Result<PlanDescription, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/coach/describe-plan"))
            .json(req)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn save_reflection(
        &self,
        game_id: &str,
        note: &ReflectionNote,
    ) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(self.url(&format!("/api/coach/games/{game_id}/reflections")))
            .json(note)
            .send()
            .await?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn sync_status(&self) -> Result<SyncStatus, ClientError> {
        let resp = self
            .client
            .get(self.url("/api/coach/sync-status"))
            .send()
            .await?;
        Self::decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvaluationType, SyncState};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> CoachClient {
        CoachClient::new(&ClientConfig::new(server.uri()))
    }

    #[tokio::test]
    async fn test_fetch_milestones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/coach/games/g42/milestones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "moveNumber": 12,
                "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "userMove": "a3",
                "bestMove": "e4",
                "cpLoss": 310,
                "evaluationType": "blunder",
                "threat": "Back rank is loose",
                "principalVariationAfterBest": ["e4", "e5", "Nf3"]
            }])))
            .mount(&server)
            .await;

        let milestones = client_for(&server).await.fetch_milestones("g42").await.unwrap();
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].move_number, 12);
        assert_eq!(milestones[0].evaluation_type, EvaluationType::Blunder);
        assert_eq!(
            milestones[0].principal_variation_after_best.as_deref(),
            Some(["e4".to_string(), "e5".to_string(), "Nf3".to_string()].as_slice())
        );
    }

    #[tokio::test]
    async fn test_fetch_focus_and_drills() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/coach/games/g1/focus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "headline": "Watch the long diagonal",
                "narrative": "Two of three losses came from b7 pressure.",
                "anchorFen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/coach/games/g1/drills"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "fen": "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
                "correctMoves": ["Rd8"],
                "hint": "Look at the back rank",
                "difficulty": "easy"
            }])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let focus = client.fetch_focus("g1").await.unwrap();
        assert_eq!(focus.headline, "Watch the long diagonal");
        let drills = client.fetch_drills("g1").await.unwrap();
        assert_eq!(drills[0].correct_moves, vec!["Rd8"]);
    }

    #[tokio::test]
    async fn test_explain_move_posts_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/coach/explain-move"))
            .and(body_json(json!({
                "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "movePlayed": "a3",
                "bestMove": "e4"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "humanExplanation": "a3 spends a tempo without fighting for the center."
            })))
            .mount(&server)
            .await;

        let req = ExplainMoveRequest {
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
            move_played: "a3".to_string(),
            best_move: "e4".to_string(),
        };
        let explanation = client_for(&server).await.explain_move(&req).await.unwrap();
        assert!(explanation.human_explanation.contains("tempo"));
    }

    #[tokio::test]
    async fn test_save_reflection_sends_note() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/coach/games/g9/reflections"))
            .and(body_json(json!({
                "moveNumber": 7,
                "selectedTags": ["missed_threat"],
                "freeText": ""
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let note = ReflectionNote {
            move_number: 7,
            selected_tags: vec!["missed_threat".to_string()],
            free_text: String::new(),
        };
        client_for(&server).await.save_reflection("g9", &note).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_body_detail_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/coach/games/missing/milestones"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Game not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .fetch_milestones("missing")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        match err {
            ClientError::Status { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Game not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/coach/sync-status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).await.sync_status().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_sync_status_parses_timestamps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/coach/sync-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "idle",
                "lastSyncedAt": "2025-05-01T10:30:00Z",
                "pendingGames": 0
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).await.sync_status().await.unwrap();
        assert_eq!(status.state, SyncState::Idle);
        assert_eq!(status.pending_games, 0);
    }
}
