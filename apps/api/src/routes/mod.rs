pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::cv::handlers as cv;
use crate::errors::AppError;
use crate::evaluation::handlers as evaluation;
use crate::interview::handlers as interview;
use crate::matching::handlers as matching;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Evaluation API
        .route(
            "/api/v1/evaluations",
            post(evaluation::handle_evaluate_batch),
        )
        .route(
            "/api/v1/evaluations/pair",
            post(evaluation::handle_evaluate_pair),
        )
        // Matching API
        .route("/api/v1/matching", post(matching::handle_match_jobs))
        // CV API
        .route("/api/v1/cv/parse", post(cv::handle_parse_cv))
        .route("/api/v1/cv/skills", post(cv::handle_extract_skills))
        // Interview API
        .route(
            "/api/v1/interview/questions",
            post(interview::handle_generate_questions),
        )
        .route(
            "/api/v1/interview/answers",
            post(interview::handle_generate_answer),
        )
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::evaluation::{EvaluationPolicy, Evaluator};
    use crate::llm_client::testing::ScriptedBackend;
    use crate::llm_client::{InferenceBackend, UnavailableBackend};

    fn app_with(backend: Arc<dyn InferenceBackend>) -> Router {
        let evaluator = Evaluator::new(backend.clone(), EvaluationPolicy::default());
        build_router(AppState::new(backend, evaluator))
    }

    fn offline_app() -> Router {
        app_with(Arc::new(UnavailableBackend))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (status, body) = send(offline_app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "unavailable");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, body) = send(offline_app(), "GET", "/api/v1/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_batch_evaluation_end_to_end() {
        let backend = Arc::new(ScriptedBackend::replying(&[
            r#"{"score": 0.9, "justification": "correct"}"#,
        ]));
        let payload = json!({
            "user_answers": {
                "Q1": "def add(a, b):\n    return a + b",
                "Q2": ""
            },
            "correct_answers": {
                "Q1": "def total(x, y): return x + y",
                "Q2": "def f(): return 1"
            }
        });

        let (status, body) = send(app_with(backend), "POST", "/api/v1/evaluations", Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"]["Q1"]["score"], 0.9);
        assert_eq!(body["results"]["Q1"]["match"], true);
        assert_eq!(body["results"]["Q2"]["method"], "empty");
        assert_eq!(body["summary"]["total"], 2);
        assert_eq!(body["summary"]["passed"], 1);
        assert_eq!(body["valid"], true);
        assert!(body["evaluation_id"].is_string());
    }

    #[tokio::test]
    async fn test_batch_evaluation_rejects_empty_answers() {
        let payload = json!({"user_answers": {}});
        let (status, body) = send(offline_app(), "POST", "/api/v1/evaluations", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_evaluation_rejects_bad_threshold() {
        let payload = json!({"user_answers": {"Q1": "x"}, "threshold": 1.5});
        let (status, _) = send(offline_app(), "POST", "/api/v1/evaluations", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pair_evaluation_falls_back_when_offline() {
        let payload = json!({
            "question": "Write a function that doubles a number.",
            "user_answer": "def double(n):\n    return n * 2",
            "correct_answer": "def twice(x): return 2 * x"
        });
        let (status, body) =
            send(offline_app(), "POST", "/api/v1/evaluations/pair", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["method"], "fallback");
        assert_eq!(body["score"], 0.5);
        assert_eq!(body["match"], false);
    }

    #[tokio::test]
    async fn test_matching_ranks_jobs() {
        let payload = json!({
            "cv": {"skills": ["Rust", "SQL"]},
            "jobs": [
                {"title": "DBA", "skills": ["SQL", "Oracle"]},
                {"company": "Ferris", "jobs": [{"title": "Backend", "skills": ["rust"]}]}
            ]
        });
        let (status, body) = send(offline_app(), "POST", "/api/v1/matching", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["matches"][0]["title"], "Backend");
        assert_eq!(body["matches"][0]["company_name"], "Ferris");
    }

    #[tokio::test]
    async fn test_skills_endpoint_uses_keyword_scan_offline() {
        let payload = json!({"cv_text": "Python developer using Docker"});
        let (status, body) = send(offline_app(), "POST", "/api/v1/cv/skills", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "keyword");
        assert_eq!(body["skills"], json!(["python", "docker"]));
    }

    #[tokio::test]
    async fn test_questions_endpoint_uses_fallback_offline() {
        let payload = json!({"knowledge_chunks": ["Python basics"], "n": 2});
        let (status, body) =
            send(offline_app(), "POST", "/api/v1/interview/questions", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_answer_endpoint_rejects_blank_question() {
        let payload = json!({"question": "   "});
        let (status, _) = send(offline_app(), "POST", "/api/v1/interview/answers", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
