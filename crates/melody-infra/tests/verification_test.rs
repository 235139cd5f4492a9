//! reCAPTCHA verifier tests against a mocked verification endpoint.

use std::time::{Duration, Instant};

use melody_infra::{HumanVerifier, RecaptchaVerifier, VerificationError};
use mockito::Matcher;

const SECRET: &str = "test-secret";

fn verifier(url: String) -> RecaptchaVerifier {
    RecaptchaVerifier::new(SECRET, url, 0.3, Duration::from_secs(5)).unwrap()
}

async fn mock_response(
    server: &mut mockito::ServerGuard,
    status: usize,
    body: &str,
    hits: usize,
) -> mockito::Mock {
    server
        .mock("POST", "/siteverify")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("secret".into(), SECRET.into()),
            Matcher::UrlEncoded("response".into(), "client-token".into()),
        ]))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_success_with_high_score_is_accepted() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_response(
        &mut server,
        200,
        r#"{"success": true, "score": 0.5, "action": "download", "hostname": "app.051205.xyz"}"#,
        1,
    )
    .await;

    let verifier = verifier(format!("{}/siteverify", server.url()));
    assert!(verifier.verify("client-token").await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_low_score_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_response(&mut server, 200, r#"{"success": true, "score": 0.1}"#, 1).await;

    let verifier = verifier(format!("{}/siteverify", server.url()));
    assert!(!verifier.verify("client-token").await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unsuccessful_check_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_response(
        &mut server,
        200,
        r#"{"success": false, "error-codes": ["timeout-or-duplicate"]}"#,
        1,
    )
    .await;

    let verifier = verifier(format!("{}/siteverify", server.url()));
    assert!(!verifier.verify("client-token").await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_response(&mut server, 200, "<html>oops</html>", 2).await;

    let verifier = verifier(format!("{}/siteverify", server.url()));
    assert!(matches!(
        verifier.fetch_result("client-token").await,
        Err(VerificationError::Malformed(_))
    ));
    assert!(!verifier.verify("client-token").await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_response(&mut server, 503, r#"{"success": true, "score": 0.9}"#, 1).await;

    let verifier = verifier(format!("{}/siteverify", server.url()));
    assert!(matches!(
        verifier.fetch_result("client-token").await,
        Err(VerificationError::Status(503))
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_token_skips_remote_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/siteverify")
        .expect(0)
        .create_async()
        .await;

    let verifier = verifier(format!("{}/siteverify", server.url()));
    assert!(!verifier.verify("").await);
    assert!(!verifier.verify("   ").await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_service_is_rejected() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let verifier = verifier(format!("http://{}/siteverify", addr));
    assert!(!verifier.verify("client-token").await);
}

#[tokio::test]
async fn test_timeout_is_rejected() {
    // Accepts connections but never answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _accept = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let verifier = RecaptchaVerifier::new(
        SECRET,
        format!("http://{}/siteverify", addr),
        0.3,
        Duration::from_millis(300),
    )
    .unwrap();

    let started = Instant::now();
    assert!(matches!(
        verifier.fetch_result("client-token").await,
        Err(VerificationError::Transport(e)) if e.is_timeout()
    ));
    assert!(!verifier.verify("client-token").await);
    assert!(started.elapsed() < Duration::from_secs(5));
}
