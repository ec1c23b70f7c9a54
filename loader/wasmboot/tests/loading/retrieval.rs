use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;
use wasmboot::{autorun, BootError, Bootstrapper, FetchError, HttpFetcher, StartRoutine};

use crate::common::COUNTER;

/// Serve a single HTTP response and hand back the request line.
async fn serve_once(status: &'static str, body: Vec<u8>) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.unwrap();

        let request = String::from_utf8_lossy(&request).into_owned();
        request.lines().next().unwrap_or_default().to_string()
    });

    (origin, handle)
}

#[tokio::test]
async fn loads_from_script_origin() {
    let (origin, server) = serve_once("200 OK", COUNTER.as_bytes().to_vec()).await;
    let script = origin.join("static/js/loader.js#counter").unwrap();
    let boot = Bootstrapper::new(HttpFetcher::for_script(&script).unwrap());

    let mut loaded = autorun(&script, &boot).await.unwrap().expect("module loaded");

    assert_eq!(server.await.unwrap(), "GET /wasm/counter.wasm HTTP/1.1");
    assert_eq!(loaded.start_routine(), StartRoutine::Export);
    assert_eq!(loaded.global("runs").and_then(|v| v.i32()), Some(1));
}

#[tokio::test]
async fn not_found_fails_the_load() {
    let (origin, server) = serve_once("404 Not Found", b"no such module".to_vec()).await;
    let boot = Bootstrapper::new(HttpFetcher::new(origin));

    let err = boot
        .load("missing", wasmboot::Environment::permissive())
        .await
        .err()
        .expect("load fails");

    assert_eq!(server.await.unwrap(), "GET /wasm/missing.wasm HTTP/1.1");
    match err {
        BootError::Fetch(FetchError::Status { status, url }) => {
            assert_eq!(status, 404);
            assert_eq!(url.path(), "/wasm/missing.wasm");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_fails_the_load() {
    let (origin, _server) = serve_once("500 Internal Server Error", Vec::new()).await;
    let boot = Bootstrapper::new(HttpFetcher::new(origin));

    let err = boot
        .load("broken", wasmboot::Environment::Secure)
        .await
        .err()
        .expect("load fails");

    assert!(
        matches!(err, BootError::Fetch(FetchError::Status { status: 500, .. })),
        "{err:?}"
    );
}

#[tokio::test]
async fn invalid_binary_fails_instantiation() {
    let (origin, _server) = serve_once("200 OK", b"not wasm at all".to_vec()).await;
    let boot = Bootstrapper::new(HttpFetcher::new(origin));

    let err = boot
        .load("garbage", wasmboot::Environment::permissive())
        .await
        .err()
        .expect("load fails");

    assert!(matches!(err, BootError::Instantiate(_)), "{err:?}");
}
