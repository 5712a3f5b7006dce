//! Integration tests for callback and deferred delivery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use bytes::Bytes;
use serde::Deserialize;
use twofold::{
    DeferredState, Error, Failure, Outcome, Request, RequestExecutor, Response, Result, Transport,
    main_queue,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ApiError {
    message: String,
}

/// Transport answering every request with the same canned reply.
#[derive(Debug, Clone)]
struct Canned {
    reply: Result<Response>,
    calls: Arc<AtomicUsize>,
}

impl Canned {
    fn body(status: u16, body: &'static str) -> Self {
        Self {
            reply: Ok(Response::new(
                status,
                std::collections::HashMap::new(),
                Bytes::from_static(body.as_bytes()),
            )),
            calls: Arc::default(),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(Error::transport(message)),
            calls: Arc::default(),
        }
    }
}

impl Transport for Canned {
    async fn send(&self, _request: Request<Bytes>) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn user_url() -> url::Url {
    url::Url::parse("https://api.example.com/user/1").expect("url")
}

#[tokio::test]
async fn test_execute_with_delivers_once_on_main_loop() {
    let (queue, mut main_loop) = main_queue();
    let transport = Canned::body(200, r#"{"id":1,"name":"Ana"}"#);
    let calls = Arc::clone(&transport.calls);
    let executor = RequestExecutor::builder(transport).dispatcher(queue).build();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    executor.execute_with(Request::get(user_url()).build(), move |outcome: Outcome<User, ApiError>| {
        sink.lock()
            .expect("sink")
            .push((thread::current().id(), outcome));
    });
    // Nothing is delivered until the loop turns.
    assert!(delivered.lock().expect("sink").is_empty());

    drop(executor);
    main_loop.run().await;

    let delivered = delivered.lock().expect("sink");
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, thread::current().id());
    assert_eq!(delivered[0].1.as_ref().map(|user| user.id), Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_with_delivers_local_failures_asynchronously() {
    let (queue, mut main_loop) = main_queue();
    let transport = Canned::body(200, "{}");
    let calls = Arc::clone(&transport.calls);
    let executor = RequestExecutor::builder(transport).dispatcher(queue).build();

    let mut body = std::collections::BTreeMap::new();
    body.insert(vec![0_u8], 1);
    let delivered = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&delivered);
    executor.execute_with(
        Request::post(user_url()).body(body).build(),
        move |outcome: Outcome<User, ApiError>| {
            *sink.lock().expect("sink") = Some(outcome);
        },
    );
    assert!(delivered.lock().expect("sink").is_none());

    assert!(main_loop.turn().await);

    let outcome = delivered.lock().expect("sink").take().expect("delivered");
    assert!(outcome.is_err_and(|failure| failure.internal().is_some_and(Error::is_encoding)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_execute_with_inline_dispatcher() {
    let executor = RequestExecutor::new(Canned::failing("offline"));
    let (sender, receiver) = tokio::sync::oneshot::channel();

    executor.execute_with(Request::get(user_url()).build(), move |outcome: Outcome<User, ApiError>| {
        let _ = sender.send(outcome);
    });

    let outcome = receiver.await.expect("delivered");
    assert_eq!(outcome, Err(Failure::Internal(Error::transport("offline"))));
}

#[tokio::test]
async fn test_execute_deferred_success() {
    let (queue, mut main_loop) = main_queue();
    let executor = RequestExecutor::builder(Canned::body(200, r#"{"id":1,"name":"Ana"}"#))
        .dispatcher(queue)
        .build();

    let deferred = executor.execute_deferred::<_, User, ApiError>(Request::get(user_url()).build());
    assert_eq!(deferred.state(), DeferredState::Pending);

    let log = Arc::new(Mutex::new(Vec::new()));
    let on_success = Arc::clone(&log);
    let on_settled = Arc::clone(&log);
    deferred
        .on_success(move |user: &User| on_success.lock().expect("log").push(user.name.clone()))
        .on_failure(|_| panic!("not a failure"))
        .on_settled(move || on_settled.lock().expect("log").push("settled".to_string()));

    assert!(main_loop.turn().await);

    assert_eq!(deferred.state(), DeferredState::Succeeded);
    assert_eq!(*log.lock().expect("log"), vec!["Ana", "settled"]);
}

#[tokio::test]
async fn test_execute_deferred_domain_failure() {
    let (queue, mut main_loop) = main_queue();
    let executor = RequestExecutor::builder(Canned::body(404, r#"{"message":"not found"}"#))
        .dispatcher(queue)
        .build();

    let deferred = executor.execute_deferred::<_, User, ApiError>(Request::get(user_url()).build());
    assert!(main_loop.turn().await);

    let outcome = deferred.outcome().expect("settled");
    let failure = outcome.expect_err("failure");
    assert_eq!(
        failure.domain(),
        Some(&ApiError {
            message: "not found".to_string()
        })
    );

    // Late observers still see the settlement.
    let late = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&late);
    deferred.on_failure(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(late.load(Ordering::SeqCst), 1);
}
