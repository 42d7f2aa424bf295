pub mod health;
pub mod knowledge;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::chat::handlers as chat;
use crate::inbox::handlers as inbox;
use crate::members::handlers as members;
use crate::profiles::handlers as profiles;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/v1/me", get(accounts::handle_me))
        // Members & health profiles
        .route(
            "/api/v1/members",
            get(members::handle_list_members).post(members::handle_create_member),
        )
        .route(
            "/api/v1/members/:id",
            get(members::handle_get_member).delete(members::handle_delete_member),
        )
        .route(
            "/api/v1/profile",
            get(profiles::handle_get_profile).patch(profiles::handle_update_profile),
        )
        // Chat
        .route(
            "/api/v1/conversations",
            get(chat::handle_list_conversations).post(chat::handle_create_conversation),
        )
        .route("/api/v1/conversations/:id", get(chat::handle_get_conversation))
        .route(
            "/api/v1/conversations/:id/messages",
            post(chat::handle_post_message),
        )
        .route("/api/v1/knowledge/domains", get(knowledge::domains_handler))
        // Practitioner inbox
        .route("/api/v1/practitioners", get(inbox::handle_list_practitioners))
        .route(
            "/api/v1/practitioners/:id/messages",
            post(inbox::handle_send_message),
        )
        .route("/api/v1/inbox", get(inbox::handle_list_inbox))
        .route("/api/v1/inbox/:id/read", patch(inbox::handle_mark_read))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::hash_token;
    use crate::llm_client::testing::ScriptedCompleter;
    use crate::models::conversation::Role;
    use crate::store::memory::MemoryStore;
    use crate::store::Store;
    use crate::testing::{signed_in, test_state};

    fn app(store: &Arc<MemoryStore>, llm: &Arc<ScriptedCompleter>) -> Router {
        build_router(test_state(store.clone(), llm.clone()))
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn fixtures() -> (Arc<MemoryStore>, Arc<ScriptedCompleter>) {
        (
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedCompleter::replying("Here is some general guidance.")),
        )
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let (store, llm) = fixtures();
        let (status, body) = send(app(&store, &llm), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "arogya-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (store, llm) = fixtures();
        let (status, body) = send(app(&store, &llm), "GET", "/api/v1/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthorized() {
        let (store, llm) = fixtures();
        let user = store.add_user("old@example.com", "member", "free");
        store.add_session(user.id, hash_token("stale").to_vec(), Duration::hours(-1));

        let (status, _) = send(app(&store, &llm), "GET", "/api/v1/me", Some("stale"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_reports_tier_and_usage() {
        let (store, llm) = fixtures();
        let (_, token) = signed_in(&store, "asha@example.com", "member", "plus");

        let (status, body) = send(app(&store, &llm), "GET", "/api/v1/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "asha@example.com");
        assert_eq!(body["usage"]["tier"], "plus");
        assert_eq!(body["usage"]["used"], 0);
        assert_eq!(body["usage"]["limit"], 300);
    }

    #[tokio::test]
    async fn test_chat_turn_over_http() {
        let (store, llm) = fixtures();
        let (_, token) = signed_in(&store, "asha@example.com", "member", "free");

        let (status, conversation) = send(
            app(&store, &llm),
            "POST",
            "/api/v1/conversations",
            Some(&token),
            Some(json!({"title": "Sleep"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = conversation["id"].as_str().unwrap().to_string();

        let (status, turn) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/conversations/{id}/messages"),
            Some(&token),
            Some(json!({"content": "Which yoga asana helps with pranayama practice?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(turn["assistant_turn"]["content"], "Here is some general guidance.");
        assert_eq!(turn["assistant_turn"]["specialized_domain"], "yoga");
        assert_eq!(turn["flagged_symptoms"], json!([]));

        let (status, detail) = send(
            app(&store, &llm),
            "GET",
            &format!("/api/v1/conversations/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let roles: Vec<&str> = detail["turns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }

    #[tokio::test]
    async fn test_emergency_over_http_skips_model() {
        let (store, llm) = fixtures();
        let (user, token) = signed_in(&store, "asha@example.com", "member", "free");
        let conversation = store
            .create_conversation(user.id, None, "Urgent")
            .await
            .unwrap();

        let (status, body) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/conversations/{}/messages", conversation.id),
            Some(&token),
            Some(json!({"content": "I have chest pain and can\u{2019}t breathe"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flagged_symptoms"], json!(["chest pain", "can't breathe"]));
        assert_eq!(body["assistant_turn"]["emergency_flag"], true);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_quota_exceeded_returns_429_without_model_call() {
        let (store, llm) = fixtures();
        let (user, token) = signed_in(&store, "asha@example.com", "member", "free");
        let conversation = store
            .create_conversation(user.id, None, "Daily")
            .await
            .unwrap();
        for i in 0..10 {
            store.seed_turn(conversation.id, Role::User, &format!("q{i}"), chrono::Utc::now());
        }

        let (status, body) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/conversations/{}/messages", conversation.id),
            Some(&token),
            Some(json!({"content": "I feel tired"})),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_deleting_member_does_not_restore_quota() {
        let (store, llm) = fixtures();
        let (_, token) = signed_in(&store, "asha@example.com", "member", "free");

        let (_, member) = send(
            app(&store, &llm),
            "POST",
            "/api/v1/members",
            Some(&token),
            Some(json!({"name": "Meera", "relationship": "child"})),
        )
        .await;
        let member_id = member["id"].as_str().unwrap().to_string();

        let (_, conversation) = send(
            app(&store, &llm),
            "POST",
            "/api/v1/conversations",
            Some(&token),
            Some(json!({"member_id": member_id})),
        )
        .await;
        let uri = format!(
            "/api/v1/conversations/{}/messages",
            conversation["id"].as_str().unwrap()
        );
        for _ in 0..10 {
            let (status, _) = send(
                app(&store, &llm),
                "POST",
                &uri,
                Some(&token),
                Some(json!({"content": "I feel tired"})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = send(
            app(&store, &llm),
            "DELETE",
            &format!("/api/v1/members/{member_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, fresh) = send(
            app(&store, &llm),
            "POST",
            "/api/v1/conversations",
            Some(&token),
            Some(json!({"title": "Again"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(
            app(&store, &llm),
            "POST",
            &format!(
                "/api/v1/conversations/{}/messages",
                fresh["id"].as_str().unwrap()
            ),
            Some(&token),
            Some(json!({"content": "I feel tired"})),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "QUOTA_EXCEEDED");
        assert_eq!(llm.calls(), 10);
    }

    #[tokio::test]
    async fn test_overlong_message_is_invalid_input() {
        let (store, llm) = fixtures();
        let (user, token) = signed_in(&store, "asha@example.com", "member", "free");
        let conversation = store
            .create_conversation(user.id, None, "Long")
            .await
            .unwrap();

        let (status, body) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/conversations/{}/messages", conversation.id),
            Some(&token),
            Some(json!({"content": "a".repeat(4001)})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(store.turn_count(conversation.id), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_502() {
        let store = Arc::new(MemoryStore::new());
        let llm = Arc::new(ScriptedCompleter::failing("upstream down"));
        let (user, token) = signed_in(&store, "asha@example.com", "member", "free");
        let conversation = store
            .create_conversation(user.id, None, "Chat")
            .await
            .unwrap();

        let (status, body) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/conversations/{}/messages", conversation.id),
            Some(&token),
            Some(json!({"content": "I feel tired"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_UNAVAILABLE");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .to_lowercase()
            .contains("internal server error"));
    }

    #[tokio::test]
    async fn test_profile_patch_rejects_unknown_fields() {
        let (store, llm) = fixtures();
        let (_, token) = signed_in(&store, "asha@example.com", "member", "free");

        let (status, body) = send(
            app(&store, &llm),
            "PATCH",
            "/api/v1/profile",
            Some(&token),
            Some(json!({"allergies": ["pollen"], "owner_id": "x", "is_admin": true})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("is_admin"));
        assert!(message.contains("owner_id"));
    }

    #[tokio::test]
    async fn test_profile_patch_then_get_for_member() {
        let (store, llm) = fixtures();
        let (_, token) = signed_in(&store, "asha@example.com", "member", "free");

        let (status, member) = send(
            app(&store, &llm),
            "POST",
            "/api/v1/members",
            Some(&token),
            Some(json!({"name": "Meera", "relationship": "child"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let member_id = member["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/profile?member_id={member_id}");

        let (status, _) = send(app(&store, &llm), "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, profile) = send(
            app(&store, &llm),
            "PATCH",
            &uri,
            Some(&token),
            Some(json!({"constitution": "kapha", "allergies": ["dust"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["member_id"], member_id.as_str());
        assert_eq!(profile["constitution"], "kapha");

        let (status, profile) = send(app(&store, &llm), "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["allergies"], json!(["dust"]));
    }

    #[tokio::test]
    async fn test_members_are_scoped_to_owner() {
        let (store, llm) = fixtures();
        let (_, owner_token) = signed_in(&store, "asha@example.com", "member", "free");
        let (_, other_token) = signed_in(&store, "ravi@example.com", "member", "free");

        let (_, member) = send(
            app(&store, &llm),
            "POST",
            "/api/v1/members",
            Some(&owner_token),
            Some(json!({"name": "Dadi", "relationship": "grandparent"})),
        )
        .await;
        let uri = format!("/api/v1/members/{}", member["id"].as_str().unwrap());

        let (status, _) = send(app(&store, &llm), "GET", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(app(&store, &llm), "DELETE", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(app(&store, &llm), "DELETE", &uri, Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, list) =
            send(app(&store, &llm), "GET", "/api/v1/members", Some(&owner_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_knowledge_domains_listing() {
        let (store, llm) = fixtures();
        let (status, body) =
            send(app(&store, &llm), "GET", "/api/v1/knowledge/domains", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["min_score"], 2);
        assert_eq!(body["domains"][0]["id"], "ayurveda");
        assert_eq!(body["domains"][0]["content_available"], true);
    }

    #[tokio::test]
    async fn test_inbox_flow() {
        let (store, llm) = fixtures();
        let (_, member_token) = signed_in(&store, "asha@example.com", "member", "free");
        let (practitioner, practitioner_token) =
            signed_in(&store, "dr.rao@example.com", "practitioner", "professional");

        let (status, list) = send(
            app(&store, &llm),
            "GET",
            "/api/v1/practitioners",
            Some(&member_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["id"], practitioner.id.to_string());

        let (status, sent) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/practitioners/{}/messages", practitioner.id),
            Some(&member_token),
            Some(json!({"subject": "Follow-up", "body": "Is triphala safe with my medication?"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(sent["read_at"].is_null());

        let (status, _) =
            send(app(&store, &llm), "GET", "/api/v1/inbox", Some(&member_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, inbox) = send(
            app(&store, &llm),
            "GET",
            "/api/v1/inbox",
            Some(&practitioner_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(inbox.as_array().unwrap().len(), 1);

        let (status, read) = send(
            app(&store, &llm),
            "PATCH",
            &format!("/api/v1/inbox/{}/read", sent["id"].as_str().unwrap()),
            Some(&practitioner_token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!read["read_at"].is_null());
    }

    #[tokio::test]
    async fn test_cannot_message_non_practitioner() {
        let (store, llm) = fixtures();
        let (_, token) = signed_in(&store, "asha@example.com", "member", "free");
        let (peer, _) = signed_in(&store, "ravi@example.com", "member", "free");

        let (status, _) = send(
            app(&store, &llm),
            "POST",
            &format!("/api/v1/practitioners/{}/messages", peer.id),
            Some(&token),
            Some(json!({"subject": "Hi", "body": "Hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
