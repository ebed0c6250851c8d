use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct ViewModel {
    day: u32,
    topic: String,
    completed: bool,
    completed_at: Option<String>,
    notes: String,
}

#[derive(Debug, Deserialize)]
struct DaysResponse {
    days: Vec<ViewModel>,
    percent: f64,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    day: ViewModel,
    percent: f64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    completed: usize,
    total_days: usize,
    next_day: Option<u32>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("hundred_days_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/days")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let curriculum_path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/days.json");
    let child = Command::new(env!("CARGO_BIN_EXE_hundred_days"))
        .env("PORT", port.to_string())
        .env("PROGRESS_BACKEND", "local")
        .env("APP_DATA_PATH", data_path)
        .env("CURRICULUM_PATH", curriculum_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn days(client: &Client, server: &TestServer) -> DaysResponse {
    client
        .get(format!("{}/api/days", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn toggle(client: &Client, server: &TestServer, day: u32, notes: &str) -> ToggleResponse {
    let response = client
        .post(format!("{}/api/days/{day}/toggle", server.base_url))
        .json(&serde_json::json!({ "notes": notes }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_lists_the_whole_curriculum_in_order() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let listing = days(&client, &server).await;
    assert_eq!(listing.days.len(), 100);
    let order: Vec<u32> = listing.days.iter().map(|view| view.day).collect();
    assert_eq!(order, (1..=100).collect::<Vec<_>>());
    assert!(listing.days.iter().all(|view| !view.topic.is_empty()));
}

#[tokio::test]
async fn http_toggle_completes_and_reopens_a_day() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = days(&client, &server).await;
    assert!(!before.days[4].completed);

    let completed = toggle(&client, &server, 5, "hello").await;
    assert_eq!(completed.day.day, 5);
    assert!(completed.day.completed);
    assert_eq!(completed.day.notes, "hello");
    assert!(completed.day.completed_at.is_some());
    assert!((completed.percent - (before.percent + 1.0)).abs() < 1e-9);

    let stats: StatsResponse = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.total_days, 100);
    assert!(stats.completed >= 1);
    assert_ne!(stats.next_day, Some(5));

    let reopened = toggle(&client, &server, 5, "ignored").await;
    assert!(!reopened.day.completed);
    assert_eq!(reopened.day.notes, "");
    assert_eq!(reopened.day.completed_at, None);
    assert!((reopened.percent - before.percent).abs() < 1e-9);

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"id="day-5""#));
}

#[tokio::test]
async fn http_unknown_day_is_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/days/500/toggle", server.base_url))
        .json(&serde_json::json!({ "notes": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{}/api/login", server.base_url))
        .json(&serde_json::json!({ "email": "learner@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
