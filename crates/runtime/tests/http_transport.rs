//! HttpTransport against an in-process GraphQL endpoint.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use dagger_runtime::{ConnectParams, HttpTransport, LazyTransport, SessionEnv, SharedTransport, Transport};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
	requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn serve(app: Router) -> String {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	addr.to_string()
}

async fn echo_stdout(State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
	let auth = headers
		.get(header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.map(str::to_string);
	captured.requests.lock().push((auth, body));
	Json(json!({ "data": { "container": { "from": { "stdout": "hello\n" } } } }))
}

#[tokio::test]
async fn posts_query_with_session_token_basic_auth() {
	let captured = Captured::default();
	let app = Router::new().route("/query", post(echo_stdout)).with_state(captured.clone());
	let host = serve(app).await;

	let transport = HttpTransport::new(ConnectParams::new(host, "tok")).unwrap();
	let query = r#"{ container { from (address: "alpine") { stdout } } }"#;
	let data = transport.execute(query).await.unwrap();

	assert_eq!(data["container"]["from"]["stdout"], "hello\n");

	let requests = captured.requests.lock();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].0.as_deref(), Some("Basic dG9rOg=="));
	assert_eq!(requests[0].1, json!({ "query": query }));
}

#[tokio::test]
async fn engine_errors_are_surfaced() {
	let app = Router::new().route(
		"/query",
		post(|| async {
			Json(json!({
				"data": null,
				"errors": [{ "message": "process \"apk add curl\" did not complete successfully: exit code: 1", "path": ["container", "from", "withExec"] }]
			}))
		}),
	);
	let host = serve(app).await;

	let transport = HttpTransport::new(ConnectParams::new(host, "tok")).unwrap();
	let err = transport.execute("{ container }").await.unwrap_err();

	assert!(err.is_transport());
	let errors = err.graphql_errors();
	assert_eq!(errors.len(), 1);
	assert!(errors[0].message.contains("exit code: 1"));
}

#[tokio::test]
async fn non_graphql_failure_reports_status() {
	let app = Router::new().route("/query", post(|| async { (StatusCode::UNAUTHORIZED, "invalid session token").into_response() }));
	let host = serve(app).await;

	let transport = HttpTransport::new(ConnectParams::new(host, "bad")).unwrap();
	let err = transport.execute("{ container }").await.unwrap_err();

	let message = err.to_string();
	assert!(message.contains("401"), "unexpected message: {message}");
	assert!(message.contains("invalid session token"));
}

#[tokio::test]
async fn missing_data_is_invalid_response() {
	let app = Router::new().route("/query", post(|| async { Json(json!({})) }));
	let host = serve(app).await;

	let transport = HttpTransport::new(ConnectParams::new(host, "tok")).unwrap();
	let err = transport.execute("{ container }").await.unwrap_err();
	assert!(matches!(err, dagger_runtime::Error::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_engine_is_transport_error() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let host = listener.local_addr().unwrap().to_string();
	drop(listener);

	let transport = HttpTransport::new(ConnectParams::new(host, "tok")).unwrap();
	let err = transport.execute("{ container }").await.unwrap_err();
	assert!(matches!(err, dagger_runtime::Error::Transport(_)));
}

#[tokio::test]
async fn lazy_transport_resolves_once_from_environment() {
	let captured = Captured::default();
	let app = Router::new().route("/query", post(echo_stdout)).with_state(captured.clone());
	let host = serve(app).await;

	let lazy = Arc::new(LazyTransport::with_env(SessionEnv {
		session_url: Some(format!("http://{host}")),
		session_token: Some("tok".to_string()),
		..SessionEnv::default()
	}));
	assert!(!lazy.is_resolved());

	let first: SharedTransport = lazy.clone();
	let second: SharedTransport = lazy.clone();
	first.execute("{ container { id } }").await.unwrap();
	assert!(lazy.is_resolved());
	let data = second.execute("{ container { from (address: \"alpine\") { stdout } } }").await.unwrap();

	assert_eq!(data["container"]["from"]["stdout"], "hello\n");
	let requests = captured.requests.lock();
	assert_eq!(requests.len(), 2);
	assert!(requests.iter().all(|(auth, _)| auth.as_deref() == Some("Basic dG9rOg==")));
}
