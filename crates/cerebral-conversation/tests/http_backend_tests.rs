#[cfg(test)]
mod tests {
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use cerebral_conversation::{
        ConversationBackend, ConversationState, HttpConversationBackend, MessageRequest,
        StartRequest,
    };

    async fn health() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "conversation_stats": {"total_sessions": 3, "active_sessions": 1, "flow_types": ["guided"]}
        }))
    }

    async fn start(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({
            "success": true,
            "session_id": format!("s-{}", body["user_id"].as_str().unwrap_or("?")),
            "current_state": "listening"
        }))
    }

    async fn message(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        match body["message"].as_str() {
            Some("fail") => (
                StatusCode::OK,
                Json(json!({
                    "success": false,
                    "session_id": body["session_id"],
                    "result": {"success": false, "error": "no such flow", "next_state": "error"}
                })),
            ),
            Some("crash") => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": "boom"})),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "result": {"success": true, "response": "hi there", "next_state": "waiting_for_input"}
                })),
            ),
        }
    }

    async fn agents() -> Json<Value> {
        Json(json!({"success": true, "agents": [{"agent_id": "a1", "agent_name": "Researcher", "skills": ["search"], "status": "active"}]}))
    }

    async fn flows() -> Json<Value> {
        Json(json!({"success": true, "flows": [{"flow_id": "f1", "flow_name": "onboarding", "flow_type": "guided", "step_count": 3}]}))
    }

    async fn session(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        if id == "gone" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"success": false, "error": "Session gone not found"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({"success": true, "session": {"session_id": id, "current_state": "flow_execution", "current_flow": "onboarding"}})),
        )
    }

    async fn serve() -> HttpConversationBackend {
        let router = Router::new()
            .route("/api/conversation/health", get(health))
            .route("/api/conversation/start", post(start))
            .route("/api/conversation/message", post(message))
            .route("/api/conversation/agents", get(agents))
            .route("/api/conversation/flows", get(flows))
            .route("/api/conversation/session/{id}", get(session));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpConversationBackend::new(format!("http://{addr}/api"))
    }

    fn message_request(text: &str) -> MessageRequest {
        MessageRequest {
            session_id: "s-1".into(),
            message: text.into(),
            message_type: "user".into(),
        }
    }

    #[tokio::test]
    async fn test_health_returns_stats() {
        let backend = serve().await;
        let stats = backend.health().await.unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.flow_types, vec!["guided"]);
    }

    #[tokio::test]
    async fn test_start_decodes_session() {
        let backend = serve().await;
        let started = backend
            .start(&StartRequest {
                user_id: "u1".into(),
                message: "hello".into(),
            })
            .await
            .unwrap();
        assert_eq!(started.session_id, "s-u1");
        assert_eq!(started.current_state, ConversationState::Listening);
    }

    #[tokio::test]
    async fn test_message_unwraps_result() {
        let backend = serve().await;
        let result = backend.message(&message_request("hello")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.response.as_deref(), Some("hi there"));
        assert_eq!(result.next_state, Some(ConversationState::WaitingForInput));
    }

    #[tokio::test]
    async fn test_reported_failure_is_not_transport() {
        let backend = serve().await;
        let result = backend.message(&message_request("fail")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no such flow"));
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let backend = serve().await;
        let err = backend.message(&message_request("crash")).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_listings_and_session() {
        let backend = serve().await;

        let agents = backend.agents().await.unwrap();
        assert_eq!(agents[0].skill_names(), vec!["search"]);

        let flows = backend.flows().await.unwrap();
        assert_eq!(flows[0].flow_type.as_deref(), Some("guided"));

        let snapshot = backend.session("s-9").await.unwrap();
        assert_eq!(snapshot.current_state, ConversationState::FlowExecution);
        assert_eq!(snapshot.current_flow.as_deref(), Some("onboarding"));

        assert!(backend.session("gone").await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_session_id_is_one_path_segment() {
        let backend = serve().await;
        let snapshot = backend.session("team/a?b=1").await.unwrap();
        assert_eq!(snapshot.session_id.as_deref(), Some("team/a?b=1"));
    }
}
