use async_trait::async_trait;
use hundred_days::errors::IdentityError;
use hundred_days::identity::{Identity, IdentityProvider, UserId};
use hundred_days::store::MemoryStore;
use hundred_days::{router, AppState, Backend, Curriculum, Scope};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

/// Accepts a fixed set of tokens; everything else is signed out.
struct FixedIdentity;

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn send_login_link(&self, _email: &str) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let user = match access_token {
            "alice-token" | "alice-refreshed" => "alice",
            "bob-token" => "bob",
            _ => return Err(IdentityError::Missing),
        };
        Ok(Identity {
            user_id: UserId::new(user),
            access_token: access_token.to_string(),
        })
    }
}

fn user(name: &str, token: &str) -> Scope {
    Scope::User(Identity {
        user_id: UserId::new(name),
        access_token: token.to_string(),
    })
}

async fn spawn_remote_app() -> (String, Arc<MemoryStore>) {
    let curriculum = Arc::new(
        Curriculum::from_json(
            br#"[{"day": 1, "topic": "Setup"}, {"day": 2, "topic": "Ownership"}]"#,
        )
        .unwrap(),
    );
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Backend::Remote,
        curriculum,
        Arc::clone(&store) as _,
        Some(Arc::new(FixedIdentity)),
        None,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    (format!("http://{addr}"), store)
}

async fn days_for(client: &Client, base_url: &str, token: &str) -> Value {
    let res = client
        .get(format!("{base_url}/api/days"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn remote_routes_reject_requests_without_a_valid_token() {
    let (base_url, store) = spawn_remote_app().await;
    let client = Client::new();

    let res = client.get(format!("{base_url}/api/days")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{base_url}/api/days/1/toggle"))
        .json(&json!({ "notes": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(format!("{base_url}/api/stats")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{base_url}/api/days"))
        .bearer_auth("stolen-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{base_url}/api/days"))
        .header("authorization", "Basic YWxpY2U6")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn each_user_sees_only_their_own_progress() {
    let (base_url, store) = spawn_remote_app().await;
    let client = Client::new();

    let res = client
        .post(format!("{base_url}/api/days/1/toggle"))
        .bearer_auth("alice-token")
        .json(&json!({ "notes": "mine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["day"]["completed"], true);
    assert_eq!(body["percent"], 50.0);

    let bob = days_for(&client, &base_url, "bob-token").await;
    assert_eq!(bob["percent"], 0.0);
    assert_eq!(bob["days"][0]["completed"], false);
    assert_eq!(bob["days"][0]["notes"], "");

    let res = client
        .get(format!("{base_url}/api/stats"))
        .bearer_auth("bob-token")
        .send()
        .await
        .unwrap();
    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["completed"], 0);
    assert_eq!(stats["next_day"], 1);

    let res = client
        .post(format!("{base_url}/api/session"))
        .json(&json!({ "access_token": "bob-token" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session: Value = res.json().await.unwrap();
    assert_eq!(session["user_id"], "bob");
    assert_eq!(session["completed"], 0);

    // A fresh token for the same user reaches the same progress.
    let alice = days_for(&client, &base_url, "alice-refreshed").await;
    assert_eq!(alice["percent"], 50.0);
    assert_eq!(alice["days"][0]["completed"], true);
    assert_eq!(alice["days"][0]["notes"], "mine");

    let alice_days: Vec<u32> = store
        .snapshot_for(&user("alice", "alice-token"))
        .keys()
        .copied()
        .collect();
    assert_eq!(alice_days, vec![1]);
    assert!(store.snapshot_for(&user("bob", "bob-token")).is_empty());
}

#[tokio::test]
async fn remote_page_renders_no_cards_before_sign_in() {
    let (base_url, _store) = spawn_remote_app().await;
    let client = Client::new();

    client
        .post(format!("{base_url}/api/days/2/toggle"))
        .bearer_auth("alice-token")
        .json(&json!({ "notes": "" }))
        .send()
        .await
        .unwrap();

    let page = client.get(&base_url).send().await.unwrap().text().await.unwrap();
    assert!(page.contains(r#"data-mode="sign-in""#));
    assert!(!page.contains(r#"id="day-2""#));
}
