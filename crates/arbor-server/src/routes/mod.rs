//! Router assembly.

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::HTTP_REQUESTS_TOTAL;
use crate::state::AppState;

pub mod chat;
pub mod nodes;
pub mod sessions;
pub mod system;

async fn track_requests(request: Request, next: Next) -> Response {
    metrics::counter!(HTTP_REQUESTS_TOTAL, "method" => request.method().to_string()).increment(1);
    next.run(request).await
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::create_exchange))
        .route("/api/nodes/{session_id}", get(nodes::list_nodes))
        .route(
            "/api/sessions",
            post(sessions::create_session)
                .get(sessions::list_sessions)
                .delete(sessions::clear_sessions),
        )
        .route(
            "/api/sessions/{session_id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/api/sessions/{session_id}/nodes",
            delete(nodes::delete_nodes),
        )
        .route(
            "/api/sessions/{session_id}/active-node",
            put(sessions::update_active_node).get(sessions::get_active_node),
        )
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/api/usage", get(system::usage))
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request as HttpRequest, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use arbor_core::messages::ChatMessage;
    use arbor_engine::ChatEngine;
    use arbor_llm::{Generated, TextGenerator, UsageLedger};
    use arbor_store::{ConnectionPool, TreeStore};

    /// Routes prompts by their leading system message, like a real model
    /// would see them.
    struct Scripted;

    #[async_trait::async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, messages: &[ChatMessage]) -> arbor_llm::Result<Generated> {
            let first = messages[0].content.as_str();
            let text = if first.contains("summarization AI") {
                "scripted summary"
            } else if first.contains("naming AI") {
                "Scripted Name"
            } else {
                "scripted reply"
            };
            Ok(Generated {
                text: text.to_string(),
                usage: None,
            })
        }
    }

    fn app() -> (Arc<TreeStore>, Router) {
        let store = Arc::new(TreeStore::new(ConnectionPool::open_in_memory().unwrap()));
        let generator: Arc<dyn TextGenerator> = Arc::new(Scripted);
        let engine = Arc::new(ChatEngine::new(Arc::clone(&store), generator));
        let state = AppState {
            store: Arc::clone(&store),
            engine,
            ledger: Arc::new(UsageLedger::new()),
            metrics: None,
        };
        (store, router(state))
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (_store, app) = app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (_store, app) = app();

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/sessions", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        let id = session["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("sess_"));
        assert!(session["name"].as_str().unwrap().starts_with("New Session"));
        assert_eq!(session["activeNodeIndex"], serde_json::Value::Null);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/api/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_appends_node_and_names_session() {
        let (store, app) = app();
        let session = store.create_session().unwrap();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/chat",
                serde_json::json!({ "sessionId": session.id, "message": "hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let node = body_json(response).await;
        assert_eq!(node["nodeIndex"], 1);
        assert_eq!(node["parentNodeIndex"], serde_json::Value::Null);
        assert_eq!(node["userMessage"], "hello");
        assert_eq!(node["aiResponse"], "scripted reply");
        assert_eq!(node["summary"], "scripted summary");

        assert_eq!(store.get_session(&session.id).unwrap().name, "Scripted Name");
    }

    #[tokio::test]
    async fn chat_with_bad_parent_is_unprocessable() {
        let (store, app) = app();
        let session = store.create_session().unwrap();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/chat",
                serde_json::json!({ "sessionId": session.id, "message": "x", "parentId": 42 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("parent"));
    }

    #[tokio::test]
    async fn chat_against_missing_session_is_not_found() {
        let (_store, app) = app();
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/chat",
                serde_json::json!({ "sessionId": "sess_missing", "message": "x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn node_listing_and_subtree_delete() {
        let (store, app) = app();
        let session = store.create_session().unwrap();

        for (message, parent) in [("root", None), ("a", Some(1)), ("b", Some(1))] {
            let mut body = serde_json::json!({ "sessionId": session.id, "message": message });
            if let Some(parent) = parent {
                body["parentId"] = serde_json::json!(parent);
            }
            let response = app
                .clone()
                .oneshot(json_request(Method::POST, "/api/chat", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/api/nodes/{}", session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let nodes = body_json(response).await;
        assert_eq!(nodes.as_array().unwrap().len(), 3);

        let response = app
            .oneshot(json_request(
                Method::DELETE,
                &format!("/api/sessions/{}/nodes", session.id),
                serde_json::json!({ "nodeIndices": [2] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["newActiveNode"], 3);
    }

    #[tokio::test]
    async fn active_node_roundtrip_and_validation() {
        let (store, app) = app();
        let session = store.create_session().unwrap();
        let _ = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/chat",
                serde_json::json!({ "sessionId": session.id, "message": "root" }),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/sessions/{}/active-node", session.id),
                serde_json::json!({ "activeNodeIndex": 1 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/api/sessions/{}/active-node", session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await["activeNodeIndex"], 1);

        let response = app
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/sessions/{}/active-node", session.id),
                serde_json::json!({ "activeNodeIndex": 99 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn clear_all_sessions_reports_count() {
        let (store, app) = app();
        let _ = store.create_session().unwrap();
        let _ = store.create_session().unwrap();

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method(Method::DELETE)
                    .uri("/api/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["cleared"], 2);
    }

    #[tokio::test]
    async fn usage_snapshot_renders() {
        let (_store, app) = app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/usage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.as_object().unwrap().is_empty());
    }
}
