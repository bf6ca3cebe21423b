//! Tests for the HTTP client against real listeners.
//!
//! The task API is started on an ephemeral port and the store is driven
//! through `HttpTaskApi`; small stub routers cover responses the task API
//! itself never produces.

use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use task_tracker::client::{ClientError, GENERIC_ERROR_MESSAGE, HttpTaskApi, TaskApi, TaskStore};
use task_tracker::config::ServerConfig;
use task_tracker::db::Database;
use task_tracker::error::ErrorCode;
use task_tracker::server::start_server;
use task_tracker::types::{TaskFilters, TaskInput, TaskStatus};
use tokio::sync::oneshot;

async fn spawn_api() -> (oneshot::Sender<()>, SocketAddr) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    start_server(db, &config).await.expect("Failed to start server")
}

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn http_store(addr: SocketAddr) -> TaskStore<HttpTaskApi> {
    TaskStore::new(HttpTaskApi::new(format!("http://{}", addr)))
}

mod task_api_tests {
    use super::*;

    #[tokio::test]
    async fn store_round_trips_through_http() {
        let (shutdown, addr) = spawn_api().await;
        let store = http_store(addr);

        let created = store
            .create_task(&TaskInput::titled("Pay bills").with_due_date("2099-01-01"))
            .await;
        assert!(created.success, "{:?}", created.error);
        let task = created.data.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(store.state().tasks[0], task);

        let other = store.create_task(&TaskInput::titled("Walk dog")).await;
        let other = other.data.unwrap();
        let patched = store.update_status(other.id, TaskStatus::Completed).await;
        assert!(patched.success);

        store
            .sync_filters(TaskFilters::new(Some("completed".into()), Some("DOG".into())))
            .await;
        let state = store.state();
        assert_eq!(state.error, None);
        assert!(!state.loading);
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].id, other.id);

        let deleted = store.delete_task(task.id).await;
        assert!(deleted.success);

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn failure_envelope_message_reaches_the_store() {
        let (shutdown, addr) = spawn_api().await;
        let store = http_store(addr);

        let failed = store.create_task(&TaskInput::titled("   ")).await;
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("Validation failed"));
        assert_eq!(store.state().error.as_deref(), Some("Validation failed"));

        let missing = store.delete_task(999).await;
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("Task not found: 999"));

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn validation_details_are_decoded() {
        let (shutdown, addr) = spawn_api().await;
        let api = HttpTaskApi::new(format!("http://{}/", addr));

        let err = api
            .create(&TaskInput::titled("").with_status("done"))
            .await
            .unwrap_err();

        match err {
            ClientError::Server {
                status,
                code,
                details,
                ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(ErrorCode::ValidationError));
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "status"]);
            }
            other => panic!("expected server error, got {:?}", other),
        }

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn stats_are_read_over_http() {
        let (shutdown, addr) = spawn_api().await;
        let api = HttpTaskApi::new(format!("http://{}", addr));
        api.create(&TaskInput::titled("a")).await.unwrap();
        api.create(&TaskInput::titled("b").with_status("cancelled"))
            .await
            .unwrap();

        let stats = api.stats().await.unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.cancelled, 1);

        let _ = shutdown.send(());
    }
}

mod boundary_tests {
    use super::*;

    #[tokio::test]
    async fn non_json_error_body_uses_generic_message() {
        let addr = spawn_stub(Router::new().route(
            "/tasks",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
        ))
        .await;
        let store = http_store(addr);

        store.fetch_tasks().await;

        let state = store.state();
        assert_eq!(state.error.as_deref(), Some(GENERIC_ERROR_MESSAGE));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn success_status_with_failed_envelope_is_an_error() {
        let addr = spawn_stub(Router::new().route(
            "/tasks",
            get(|| async { Json(json!({"success": false, "error": "maintenance window"})) }),
        ))
        .await;
        let api = HttpTaskApi::new(format!("http://{}", addr));

        let err = api.list(&TaskFilters::default()).await.unwrap_err();

        assert!(matches!(err, ClientError::Server { status: 200, .. }));
        assert_eq!(err.user_message(), "maintenance window");
    }

    #[tokio::test]
    async fn refused_connection_reports_transport_message() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let store = http_store(addr);

        let result = store.create_task(&TaskInput::titled("offline")).await;

        assert!(!result.success);
        let message = result.error.unwrap();
        assert!(!message.is_empty());
        assert_ne!(message, GENERIC_ERROR_MESSAGE);

        let err = store
            .api()
            .create(&TaskInput::titled("offline"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
