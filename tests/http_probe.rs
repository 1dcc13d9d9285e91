use ip_proxy_check::{
    proxy::{run, run_http, HttpTransport, ProbeClassifier},
    ProbeError, ProbeOutcome, SilentReporter, ValidatorConfig, ValidatorError,
};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration, Instant};

/// Echo URL that is never resolved; the mock proxy answers for it
const ECHO_URL: &str = "http://echo.test/";

/// How the mock proxy answers
#[derive(Clone)]
enum Reply {
    Body(u16, &'static str),
    /// Accept the connection and never answer
    Silent,
}

/// Start a mock forward proxy and return its port plus the request lines it saw
async fn start_mock_proxy(reply: Reply) -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let reply = reply.clone();
            let log = Arc::clone(&log);
            tokio::spawn(async move { serve(stream, reply, log).await });
        }
    });

    (port, seen)
}

async fn serve(mut stream: TcpStream, reply: Reply, log: Arc<Mutex<Vec<String>>>) {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buffer).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buffer[..n]),
        }
    }

    let head = String::from_utf8_lossy(&request);
    if let Some(line) = head.lines().next() {
        log.lock().unwrap().push(line.to_string());
    }

    match reply {
        Reply::Body(status, body) => {
            let response = format!(
                "HTTP/1.1 {} Mock\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }
}

fn classifier(timeout: Duration) -> ProbeClassifier {
    ProbeClassifier::new(HttpTransport::new(ECHO_URL, timeout))
}

#[tokio::test]
async fn test_probe_goes_through_proxy_and_matches() {
    let (port, seen) = start_mock_proxy(Reply::Body(200, "127.0.0.1\n")).await;

    let outcome = classifier(Duration::from_secs(5))
        .classify(&format!("http://127.0.0.1:{}", port))
        .await;

    assert_eq!(outcome, ProbeOutcome::Valid("127.0.0.1".to_string()));
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("GET http://echo.test/"), "{}", seen[0]);
}

#[tokio::test]
async fn test_probe_reports_foreign_ip() {
    let (port, _) = start_mock_proxy(Reply::Body(200, "5.6.7.8")).await;

    let outcome = classifier(Duration::from_secs(5))
        .classify(&format!("http://127.0.0.1:{}", port))
        .await;

    assert_eq!(outcome, ProbeOutcome::Invalid("5.6.7.8".to_string()));
}

#[tokio::test]
async fn test_probe_non_success_status() {
    let (port, _) = start_mock_proxy(Reply::Body(503, "busy")).await;

    let outcome = classifier(Duration::from_secs(5))
        .classify(&format!("http://127.0.0.1:{}", port))
        .await;

    assert_eq!(outcome, ProbeOutcome::ProbeError(ProbeError::HttpStatus(503)));
}

#[tokio::test]
async fn test_probe_times_out_on_silent_proxy() {
    let (port, _) = start_mock_proxy(Reply::Silent).await;

    let started = Instant::now();
    let outcome = classifier(Duration::from_millis(300))
        .classify(&format!("http://127.0.0.1:{}", port))
        .await;

    assert_eq!(outcome, ProbeOutcome::ProbeError(ProbeError::Timeout));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_probe_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let outcome = classifier(Duration::from_secs(2))
        .classify(&format!("http://127.0.0.1:{}", port))
        .await;

    match outcome {
        ProbeOutcome::ProbeError(ProbeError::Parse { .. }) => panic!("address should parse"),
        ProbeOutcome::ProbeError(_) => {}
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_silent_proxy_does_not_hold_up_others() {
    let (silent_port, _) = start_mock_proxy(Reply::Silent).await;
    let (good_port, _) = start_mock_proxy(Reply::Body(200, "127.0.0.1")).await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("res.txt");
    let output = dir.path().join("success.txt");
    std::fs::write(
        &input,
        format!(
            "http://127.0.0.1:{}\nhttp://127.0.0.1:{}\n",
            silent_port, good_port
        ),
    )
    .unwrap();

    let config = ValidatorConfig::new()
        .with_input(&input)
        .with_output(&output)
        .with_workers(2)
        .with_timeout(Duration::from_millis(500));

    let summary = timeout(
        Duration::from_secs(10),
        run(&config, classifier(config.probe_timeout), Arc::new(SilentReporter)),
    )
    .await
    .expect("run did not finish")
    .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.valid, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        format!("http://127.0.0.1:{}\n", good_port)
    );
}

#[tokio::test]
async fn test_fetch_direct_reads_own_ip() {
    // without a proxy the request goes straight to the mock, which acts as the echo service
    let (port, seen) = start_mock_proxy(Reply::Body(200, " 203.0.113.9\n")).await;
    let transport = HttpTransport::new(
        format!("http://127.0.0.1:{}/", port),
        Duration::from_secs(5),
    );

    assert_eq!(transport.fetch_direct().await.unwrap(), "203.0.113.9");
    assert!(seen.lock().unwrap()[0].starts_with("GET / "));
}

#[tokio::test]
async fn test_preflight_failure_aborts_run() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("res.txt");
    let output = dir.path().join("success.txt");
    std::fs::write(&input, "http://1.2.3.4:8080\n").unwrap();

    let config = ValidatorConfig::new()
        .with_input(&input)
        .with_output(&output)
        .with_echo_endpoint(format!("http://127.0.0.1:{}/", port))
        .with_timeout(Duration::from_secs(2))
        .with_preflight(true);

    let err = run_http(&config, Arc::new(SilentReporter)).await.unwrap_err();
    assert!(matches!(err, ValidatorError::Preflight(_)));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[tokio::test]
async fn test_preflight_success_runs_pool() {
    let (port, _) = start_mock_proxy(Reply::Body(200, "198.51.100.7")).await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("res.txt");
    let output = dir.path().join("success.txt");
    std::fs::write(&input, "not a url\n").unwrap();

    let config = ValidatorConfig::new()
        .with_input(&input)
        .with_output(&output)
        .with_echo_endpoint(format!("http://127.0.0.1:{}/", port))
        .with_preflight(true);

    let summary = run_http(&config, Arc::new(SilentReporter)).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}
