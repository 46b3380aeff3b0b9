pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::access::handlers as access;
use crate::access::receipts::MAX_RECEIPT_BYTES;
use crate::builder::handlers as builder;
use crate::profile::handlers as profile;
use crate::state::AppState;

/// Headroom for multipart framing around the receipt itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard sessions
        .route("/api/v1/cv/templates", get(builder::handle_list_templates))
        .route("/api/v1/cv/sessions", post(builder::handle_open_session))
        .route(
            "/api/v1/cv/sessions/:id",
            get(builder::handle_get_session).delete(builder::handle_close_session),
        )
        .route("/api/v1/cv/sessions/:id/next", post(builder::handle_next_step))
        .route("/api/v1/cv/sessions/:id/back", post(builder::handle_back_step))
        .route(
            "/api/v1/cv/sessions/:id/fields",
            patch(builder::handle_update_field),
        )
        .route(
            "/api/v1/cv/sessions/:id/experiences",
            post(builder::handle_add_experience),
        )
        .route(
            "/api/v1/cv/sessions/:id/experiences/:exp_id",
            patch(builder::handle_update_experience).delete(builder::handle_remove_experience),
        )
        .route(
            "/api/v1/cv/sessions/:id/education",
            post(builder::handle_add_education),
        )
        .route(
            "/api/v1/cv/sessions/:id/education/:edu_id",
            patch(builder::handle_update_education).delete(builder::handle_remove_education),
        )
        .route(
            "/api/v1/cv/sessions/:id/skills",
            post(builder::handle_add_skill).delete(builder::handle_remove_skill),
        )
        .route(
            "/api/v1/cv/sessions/:id/layout",
            patch(builder::handle_update_layout),
        )
        .route(
            "/api/v1/cv/sessions/:id/improve",
            post(builder::handle_improve),
        )
        .route(
            "/api/v1/cv/sessions/:id/preview",
            get(builder::handle_preview),
        )
        // Export gate and paywall
        .route("/api/v1/cv/sessions/:id/export", post(access::handle_export))
        .route("/api/v1/cv/access", get(access::handle_access_status))
        .route("/api/v1/cv/plans", get(access::handle_list_plans))
        .route(
            "/api/v1/cv/sessions/:id/paywall/plan",
            post(access::handle_select_plan),
        )
        .route(
            "/api/v1/cv/sessions/:id/paywall/checkout",
            post(access::handle_checkout),
        )
        .route(
            "/api/v1/cv/sessions/:id/paywall/back",
            post(access::handle_back_to_plans),
        )
        .route(
            "/api/v1/cv/sessions/:id/paywall/close",
            post(access::handle_close_paywall),
        )
        .route(
            "/api/v1/cv/sessions/:id/paywall/receipt",
            post(access::handle_submit_receipt).layer(DefaultBodyLimit::max(
                MAX_RECEIPT_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        // Profile and admin
        .route("/api/v1/profile", patch(profile::handle_update_profile))
        .route(
            "/api/v1/admin/subscriptions",
            get(access::handle_list_subscriptions),
        )
        .route(
            "/api/v1/admin/subscriptions/:id/approve",
            post(access::handle_approve_subscription),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::access::gate::tests::profile;
    use crate::access::paywall::fakes::MemoryReceiptStore;
    use crate::access::subscriptions::memory::MemorySubscriptionStore;
    use crate::builder::improve::fakes::{Behaviour, FakeImprover};
    use crate::builder::session::SessionStore;
    use crate::config::Config;
    use crate::models::user::UserProfile;
    use crate::profile::memory::MemoryProfileStore;

    struct Harness {
        app: Router,
        profiles: Arc<MemoryProfileStore>,
    }

    fn harness(users: impl IntoIterator<Item = UserProfile>, behaviour: Behaviour) -> Harness {
        let profiles = Arc::new(MemoryProfileStore::with(users));
        let config = Config::for_tests();
        let state = AppState {
            profiles: profiles.clone(),
            subscriptions: Arc::new(MemorySubscriptionStore::default()),
            receipts: Arc::new(MemoryReceiptStore::default()),
            improver: Arc::new(FakeImprover::new(behaviour)),
            sessions: SessionStore::new(config.session_limit),
            config,
        };
        Harness {
            app: build_router(state),
            profiles,
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        });
        (status, value)
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/v1/cv/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    fn receipt_request(uri: &str) -> Request<Body> {
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"receipt\"; filename=\"talao.pdf\"\r\n\
            Content-Type: application/pdf\r\n\r\n\
            %PDF-1.4 comprovativo\r\n\
            --XBOUNDARY--\r\n";
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                "multipart/form-data; boundary=XBOUNDARY",
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness([], Behaviour::Fail);
        let (status, body) = send(&h.app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_wizard_editing_updates_strength() {
        let h = harness([], Behaviour::Fail);
        let id = open_session(&h.app).await;
        let base = format!("/api/v1/cv/sessions/{id}");

        let (_, body) = send(
            &h.app,
            Method::PATCH,
            &format!("{base}/fields"),
            Some(json!({"field": "full_name", "value": "Maria Quissanga"})),
        )
        .await;
        assert_eq!(body["strength"]["score"], 10);

        let (status, body) = send(&h.app, Method::POST, &format!("{base}/experiences"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let exp_id = body["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &h.app,
            Method::PATCH,
            &format!("{base}/experiences/{exp_id}"),
            Some(json!({"field": "role", "value": "Contabilista"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(
            &h.app,
            Method::POST,
            &format!("{base}/skills"),
            Some(json!({"value": "Excel"})),
        )
        .await;
        assert_eq!(body["changed"], true);
        let (_, body) = send(
            &h.app,
            Method::POST,
            &format!("{base}/skills"),
            Some(json!({"value": "Excel"})),
        )
        .await;
        assert_eq!(body["changed"], false);
        assert_eq!(body["session"]["cv"]["skills"], json!(["Excel"]));

        let (status, _) = send(
            &h.app,
            Method::PATCH,
            &format!("{base}/experiences/{}", Uuid::new_v4()),
            Some(json!({"field": "role", "value": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_step_navigation_clamps() {
        let h = harness([], Behaviour::Fail);
        let id = open_session(&h.app).await;

        let (_, body) = send(&h.app, Method::POST, &format!("/api/v1/cv/sessions/{id}/back"), None).await;
        assert_eq!(body["step_number"], 1);
        for _ in 0..6 {
            send(&h.app, Method::POST, &format!("/api/v1/cv/sessions/{id}/next"), None).await;
        }
        let (_, body) = send(&h.app, Method::GET, &format!("/api/v1/cv/sessions/{id}"), None).await;
        assert_eq!(body["step_number"], 5);
        assert_eq!(body["step"], "final_summary");
    }

    #[tokio::test]
    async fn test_export_requires_sign_in() {
        let h = harness([], Behaviour::Fail);
        let id = open_session(&h.app).await;
        let (status, body) =
            send(&h.app, Method::POST, &format!("/api/v1/cv/sessions/{id}/export"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn test_credit_export_then_paywall() {
        let user = profile(1);
        let user_id = user.id;
        let h = harness([user], Behaviour::Fail);
        let id = open_session(&h.app).await;
        let export = format!("/api/v1/cv/sessions/{id}/export?user_id={user_id}");

        let (status, body) = send(&h.app, Method::POST, &export, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grant"], "credit");
        assert_eq!(body["remaining_credits"], 0);
        assert!(body["html"].as_str().unwrap().contains("ANGOLIFE"));
        assert_eq!(h.profiles.snapshot(user_id).unwrap().cv_credits, 0);

        let (status, body) = send(&h.app, Method::POST, &export, None).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["error"]["code"], "PAYMENT_REQUIRED");

        let (_, session) = send(&h.app, Method::GET, &format!("/api/v1/cv/sessions/{id}"), None).await;
        assert_eq!(session["paywall"]["visible"], true);
        assert_eq!(session["paywall"]["step"], "plans");
    }

    #[tokio::test]
    async fn test_preview_never_consumes_credits() {
        let user = profile(1);
        let user_id = user.id;
        let h = harness([user], Behaviour::Fail);
        let id = open_session(&h.app).await;

        for _ in 0..3 {
            let (status, body) = send(
                &h.app,
                Method::GET,
                &format!("/api/v1/cv/sessions/{id}/preview?user_id={user_id}"),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.as_str().unwrap().contains("ANGOLIFE"));
        }
        assert_eq!(h.profiles.snapshot(user_id).unwrap().cv_credits, 1);
    }

    #[tokio::test]
    async fn test_improve_falls_back_to_original_on_provider_error() {
        let user = profile(0);
        let user_id = user.id;
        let h = harness([user], Behaviour::Fail);
        let id = open_session(&h.app).await;
        send(
            &h.app,
            Method::PATCH,
            &format!("/api/v1/cv/sessions/{id}/fields"),
            Some(json!({"field": "summary", "value": "Gestora de vendas"})),
        )
        .await;

        let (status, body) = send(
            &h.app,
            Method::POST,
            &format!("/api/v1/cv/sessions/{id}/improve?user_id={user_id}"),
            Some(json!({"kind": "summary"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "fallback");
        assert_eq!(body["text"], "Gestora de vendas");
        assert_eq!(body["session"]["cv"]["summary"], "Gestora de vendas");
    }

    #[tokio::test]
    async fn test_improve_anonymous_is_unauthorized() {
        let h = harness([], Behaviour::Prefix("+"));
        let id = open_session(&h.app).await;
        let (status, _) = send(
            &h.app,
            Method::POST,
            &format!("/api/v1/cv/sessions/{id}/improve"),
            Some(json!({"kind": "summary", "text": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_paywall_receipt_and_admin_approval_unlock_export() {
        let buyer = profile(0);
        let buyer_id = buyer.id;
        let mut admin = profile(0);
        admin.is_admin = true;
        let admin_id = admin.id;
        let h = harness([buyer, admin], Behaviour::Fail);
        let id = open_session(&h.app).await;
        let base = format!("/api/v1/cv/sessions/{id}");

        // Receipt before checkout is out of order.
        let response = h
            .app
            .clone()
            .oneshot(receipt_request(&format!("{base}/paywall/receipt?user_id={buyer_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let (_, flow) = send(
            &h.app,
            Method::POST,
            &format!("{base}/paywall/plan"),
            Some(json!({"plan": "yearly"})),
        )
        .await;
        assert_eq!(flow["selected_plan"], "yearly");
        let (_, flow) = send(&h.app, Method::POST, &format!("{base}/paywall/checkout"), None).await;
        assert_eq!(flow["step"], "checkout");

        let response = h
            .app
            .clone()
            .oneshot(receipt_request(&format!("{base}/paywall/receipt?user_id={buyer_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let submitted: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(submitted["paywall"]["step"], "pending");
        let request_id = submitted["request"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &h.app,
            Method::GET,
            &format!("/api/v1/admin/subscriptions?user_id={buyer_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, listed) = send(
            &h.app,
            Method::GET,
            &format!("/api/v1/admin/subscriptions?user_id={admin_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, approved) = send(
            &h.app,
            Method::POST,
            &format!("/api/v1/admin/subscriptions/{request_id}/approve?user_id={admin_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["is_premium"], true);

        let (status, body) = send(
            &h.app,
            Method::POST,
            &format!("{base}/export?user_id={buyer_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grant"], "premium");
        assert!(body["remaining_credits"].is_null());
        assert!(!body["html"].as_str().unwrap().contains("ANGOLIFE"));
    }

    #[tokio::test]
    async fn test_admin_routes_need_a_known_admin_id() {
        let member = profile(0);
        let member_id = member.id;
        let h = harness([member], Behaviour::Fail);
        let routes = [
            (Method::GET, "/api/v1/admin/subscriptions".to_string()),
            (
                Method::POST,
                format!("/api/v1/admin/subscriptions/{}/approve", Uuid::new_v4()),
            ),
        ];

        for (method, uri) in routes {
            let (status, _) = send(&h.app, method.clone(), &uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            let unknown = format!("{uri}?user_id={}", Uuid::new_v4());
            let (status, _) = send(&h.app, method.clone(), &unknown, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            let member = format!("{uri}?user_id={member_id}");
            let (status, _) = send(&h.app, method, &member, None).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_access_status_plans_and_templates() {
        let (status, body) = send(
            &harness([], Behaviour::Fail).app,
            Method::GET,
            "/api/v1/cv/access",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_authenticated"], false);
        assert_eq!(body["can_export"], false);

        let (_, plans) = send(
            &harness([], Behaviour::Fail).app,
            Method::GET,
            "/api/v1/cv/plans",
            None,
        )
        .await;
        let ids: Vec<&str> = plans
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["pack3", "monthly", "yearly"]);

        let (_, templates) = send(
            &harness([], Behaviour::Fail).app,
            Method::GET,
            "/api/v1/cv/templates",
            None,
        )
        .await;
        assert_eq!(templates.as_array().unwrap().len(), 4);
        assert_eq!(templates[0]["id"], "classic");
    }

    #[tokio::test]
    async fn test_closed_session_is_gone() {
        let h = harness([], Behaviour::Fail);
        let id = open_session(&h.app).await;
        let (status, _) =
            send(&h.app, Method::DELETE, &format!("/api/v1/cv/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) =
            send(&h.app, Method::GET, &format!("/api/v1/cv/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_profile_patch_requires_sign_in() {
        let user = profile(0);
        let user_id = user.id;
        let h = harness([user], Behaviour::Fail);

        let (status, _) = send(
            &h.app,
            Method::PATCH,
            "/api/v1/profile",
            Some(json!({"full_name": "Ana"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &h.app,
            Method::PATCH,
            &format!("/api/v1/profile?user_id={user_id}"),
            Some(json!({"full_name": "Ana", "phone": "+244 923 000 000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["full_name"], "Ana");
    }
}
