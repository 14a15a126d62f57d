use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use campus_api::{AppStateInner, router};
use campus_db::Database;
use campus_gateway::dispatcher::Dispatcher;
use campus_match::{MatchEngine, QuotaPolicy};
use campus_types::events::Notification;

const SECRET: &str = "test-secret";

struct TestApp {
    app: Router,
    dispatcher: Dispatcher,
    engine: Arc<MatchEngine>,
}

impl TestApp {
    fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();
        let engine = Arc::new(MatchEngine::new(
            db,
            QuotaPolicy::default(),
            Arc::new(dispatcher.clone()),
        ));
        let state = Arc::new(AppStateInner {
            engine: engine.clone(),
            jwt_secret: SECRET.into(),
            email_domain: Some("campus.edu".into()),
        });
        Self {
            app: router(state),
            dispatcher,
            engine,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = body.map(|v| Body::from(v.to_string())).unwrap_or_else(Body::empty);

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register `name`@campus.edu and return (student_id, token).
    async fn register(&self, name: &str) -> (i64, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": format!("{}@campus.edu", name),
                    "password": "correct horse",
                    "name": name,
                    "gender": "female",
                    "dateOfBirth": "2003-05-01",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        (
            body["studentId"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    async fn swipe(&self, token: &str, target: i64, like: bool, super_like: bool) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/swipe",
            Some(token),
            Some(json!({ "targetId": target, "isLike": like, "isSuperLike": super_like })),
        )
        .await
    }
}

#[tokio::test]
async fn register_and_login() {
    let t = TestApp::new();
    let (id, _) = t.register("ada").await;

    let (status, body) = t
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ADA@campus.edu", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["studentId"], id);

    let (status, _) = t
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@campus.edu", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_is_validated() {
    let t = TestApp::new();
    t.register("ada").await;

    let mut request = json!({
        "email": "ada@campus.edu",
        "password": "correct horse",
        "name": "Ada",
        "gender": "female",
        "dateOfBirth": "2003-05-01",
    });
    let (status, body) = t.call(Method::POST, "/auth/register", None, Some(request.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "EmailTaken");

    request["email"] = json!("ada@elsewhere.org");
    let (status, _) = t.call(Method::POST, "/auth/register", None, Some(request.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    request["email"] = json!("young@campus.edu");
    request["dateOfBirth"] = json!("2020-01-01");
    let (status, _) = t.call(Method::POST, "/auth/register", None, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let t = TestApp::new();
    let (status, _) = t.call(Method::GET, "/quota", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.call(Method::GET, "/quota", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutual_like_matches_and_notifies_both() {
    let t = TestApp::new();
    let (a, token_a) = t.register("alice").await;
    let (b, token_b) = t.register("bea").await;
    let (_, mut inbox_a) = t.dispatcher.register(a);
    let (_, mut inbox_b) = t.dispatcher.register(b);

    let (status, body) = t.swipe(&token_a, b, true, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isMatch"], false);
    assert_eq!(body["remainingSuperLikes"], 3);
    assert!(inbox_a.try_recv().is_err());

    let (status, body) = t.swipe(&token_b, a, true, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isMatch"], true);
    let match_id = body["matchId"].as_i64().unwrap();

    assert!(matches!(
        inbox_a.try_recv(),
        Ok(Notification::MatchCreated { student_id, match_id: id, .. }) if student_id == b && id == match_id
    ));
    assert!(matches!(
        inbox_b.try_recv(),
        Ok(Notification::MatchCreated { student_id, .. }) if student_id == a
    ));

    let (_, matches) = t.call(Method::GET, "/matches", Some(&token_a), None).await;
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["studentId"], b);
    assert_eq!(matches[0]["name"], "bea");
    assert_eq!(t.engine.db().count_matches_between(a, b).unwrap(), 1);
}

#[tokio::test]
async fn invalid_and_duplicate_swipes_are_rejected() {
    let t = TestApp::new();
    let (a, token_a) = t.register("alice").await;
    let (b, _) = t.register("bea").await;

    let (status, body) = t.swipe(&token_a, a, true, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidTarget");

    let (status, _) = t.swipe(&token_a, 9999, true, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    t.swipe(&token_a, b, false, false).await;
    let (status, body) = t.swipe(&token_a, b, true, false).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateSwipe");
}

#[tokio::test]
async fn super_likes_run_out_after_three() {
    let t = TestApp::new();
    let (_, token) = t.register("s1").await;
    let mut targets = Vec::new();
    for name in ["s2", "s3", "s4", "s5"] {
        targets.push(t.register(name).await.0);
    }

    for (target, expected) in targets[..3].iter().zip([2, 1, 0]) {
        let (status, body) = t.swipe(&token, *target, true, true).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remainingSuperLikes"], expected);
    }

    let (status, body) = t.swipe(&token, targets[3], true, true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "QuotaExhausted");
    assert_eq!(body["remainingSuperLikes"], 0);

    let (_, quota) = t.call(Method::GET, "/quota", Some(&token), None).await;
    let super_likes = quota["quotas"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["kind"] == "superLike")
        .unwrap();
    assert_eq!(super_likes["remaining"], 0);
}

#[tokio::test]
async fn reselecting_a_plan_does_not_refill_quotas() {
    let t = TestApp::new();
    let (_, token) = t.register("s1").await;
    let mut targets = Vec::new();
    for name in ["s2", "s3", "s4", "s5", "s6"] {
        targets.push(t.register(name).await.0);
    }
    for target in &targets[..3] {
        let (status, _) = t.swipe(&token, *target, true, true).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = t
        .call(Method::PUT, "/subscription", Some(&token), Some(json!({ "plan": "free" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let super_likes = body["quotas"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["kind"] == "superLike")
        .unwrap();
    assert_eq!(super_likes["remaining"], 0);

    let (status, body) = t.swipe(&token, targets[3], true, true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "QuotaExhausted");

    // Upgrading grants only the extra premium allowance.
    t.call(Method::PUT, "/subscription", Some(&token), Some(json!({ "plan": "premium" })))
        .await;
    t.call(Method::PUT, "/subscription", Some(&token), Some(json!({ "plan": "free" })))
        .await;
    let (status, body) = t.swipe(&token, targets[3], true, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remainingSuperLikes"], 1);
    let (status, _) = t.swipe(&token, targets[4], true, true).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn undo_restores_last_profile_once_per_day() {
    let t = TestApp::new();
    let (_, token) = t.register("alice").await;
    let (b, _) = t.register("bea").await;
    let (c, _) = t.register("cleo").await;

    let (status, body) = t.call(Method::POST, "/swipe/undo", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    t.swipe(&token, b, true, false).await;
    t.swipe(&token, c, false, false).await;

    let (status, body) = t.call(Method::POST, "/swipe/undo", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["restoredProfileId"], c);

    let (status, _) = t.swipe(&token, c, true, false).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.call(Method::POST, "/swipe/undo", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("restoredProfileId").is_none());
}

#[tokio::test]
async fn blocking_hides_profile_and_prevents_swipes() {
    let t = TestApp::new();
    let (a, token_a) = t.register("alice").await;
    let (b, token_b) = t.register("bea").await;
    let (c, _) = t.register("cleo").await;

    let (status, _) = t.call(Method::POST, &format!("/blocks/{}", a), Some(&token_b), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = t.swipe(&token_a, b, true, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "TargetUnavailable");

    let (_, queue) = t.call(Method::GET, "/discover", Some(&token_a), None).await;
    let ids: Vec<i64> = queue
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![c]);
}

#[tokio::test]
async fn boost_needs_premium() {
    let t = TestApp::new();
    let (_, token) = t.register("alice").await;

    let (status, body) = t.call(Method::POST, "/boost", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "QuotaExhausted");

    let (status, body) = t
        .call(Method::PUT, "/subscription", Some(&token), Some(json!({ "plan": "premium" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "premium");

    let (status, body) = t.call(Method::POST, "/boost", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remainingBoosts"], 0);

    let (_, me) = t.call(Method::GET, "/me", Some(&token), None).await;
    assert!(me["boostedUntil"].is_string());
}

#[tokio::test]
async fn unmatch_removes_match_from_both_lists() {
    let t = TestApp::new();
    let (a, token_a) = t.register("alice").await;
    let (b, token_b) = t.register("bea").await;

    t.swipe(&token_a, b, true, false).await;
    let (_, body) = t.swipe(&token_b, a, true, false).await;
    let match_id = body["matchId"].as_i64().unwrap();

    let (status, _) = t
        .call(Method::POST, &format!("/matches/{}/unmatch", match_id), Some(&token_b), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, matches) = t.call(Method::GET, "/matches", Some(&token_a), None).await;
    assert!(matches.as_array().unwrap().is_empty());

    let (status, _) = t
        .call(Method::POST, "/matches/424242/unmatch", Some(&token_a), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
