//! User API demo
//!
//! Runs the three ways of consuming an outcome against a local mock server:
//! awaiting it, receiving it on a main loop callback, and observing a
//! deferred value.

// Demo-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(dead_code)]

use std::fmt;
use std::time::Duration;

use twofold::prelude::*;
use twofold::url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Data Types
// ============================================================================

/// A user, as the server returns it on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// The server's error body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Request to create a user.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
}

// ============================================================================
// Mock server
// ============================================================================

async fn start_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "name": "Ana"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "no such user"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 2, "name": "Bo"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/user/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    server
}

fn describe(outcome: &Outcome<User, ApiError>) -> String {
    match outcome {
        Ok(user) => format!("user #{} {}", user.id, user.name),
        Err(Failure::Domain(err)) => format!("server refused: {}", err.message),
        Err(Failure::Internal(err)) => format!("request failed: {err}"),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let server = start_server().await;
    let base = Url::parse(&server.uri())?;

    let transport = HyperTransport::builder()
        .timeout(Duration::from_secs(5))
        .default_header("User-Agent", "twofold-demo")
        .with_logging()
        .build();

    // Awaiting the outcome directly
    println!("=== execute ===");
    let executor = RequestExecutor::new(transport.clone());
    for route in ["user/1", "user/404"] {
        let request = Request::get(base.join(route)?).build();
        let outcome: Outcome<User, ApiError> = executor.execute(request).await;
        println!("GET /{route}: {}", describe(&outcome));
    }

    let request = Request::delete(base.join("user/1")?).build();
    let outcome: Outcome<User, ApiError> = executor.execute(request).await;
    println!("DELETE /user/1: {}", describe(&outcome));

    // Callbacks delivered on the main loop
    println!("\n=== execute_with ===");
    let (queue, mut main_loop) = main_queue();
    let executor = RequestExecutor::builder(transport.clone())
        .dispatcher(queue)
        .build();

    let request = Request::post(base.join("users")?)
        .body(NewUser {
            name: "Bo".to_string(),
        })
        .build();
    executor.execute_with(request, |outcome: Outcome<User, ApiError>| {
        println!("POST /users: {}", describe(&outcome));
    });
    main_loop.turn().await;

    // Deferred value with chained observers
    println!("\n=== execute_deferred ===");
    let deferred = executor.execute_deferred::<_, User, ApiError>(
        Request::get(base.join("user/404")?).build(),
    );
    deferred
        .on_success(|user| println!("GET /user/404: found {}", user.name))
        .on_failure(|failure| println!("GET /user/404: {failure}"))
        .on_settled(|| println!("GET /user/404: settled"));
    main_loop.turn().await;

    println!("final state: {:?}", deferred.state());
    Ok(())
}
