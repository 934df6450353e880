//! Wire-protocol tests against a loopback stub server.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use gridcred_client::{
    AuthToken, ClientState, CredentialIssuanceClient, Error, IssuerConfig, TrustContext,
};
use gridcred_pki::{Credential, CsrBuilder, KeyAlgorithm, SigningKey, WriteOutcome, WritePolicy};

/// Serves exactly one HTTP exchange and hands back the raw request.
async fn serve_once(
    status: u16,
    reason: &'static str,
    body: String,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(request);
    });

    (format!("http://{addr}/issue"), rx)
}

/// Reads one HTTP request (headers plus content-length body) off a socket.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = find(&buf, b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..header_end]);
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// A self-signed certificate PEM expiring `validity_secs` from now.
fn stub_certificate_pem(validity_secs: i64) -> String {
    let key = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
    let mut params = rcgen::CertificateParams::default();
    params
        .distinguished_name
        .push(rcgen::DnType::CountryName, "US");
    params
        .distinguished_name
        .push(rcgen::DnType::OrganizationName, "Stub CA");
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "jdoe@example.org");
    let now = time::OffsetDateTime::now_utc();
    params.not_before = now - time::Duration::minutes(1);
    params.not_after = now + time::Duration::seconds(validity_secs);
    params.self_signed(&key).unwrap().pem()
}

fn stub_client(url: &str) -> CredentialIssuanceClient {
    let config = IssuerConfig::new(url)
        .unwrap()
        .allow_plain_http(true)
        .with_timeout(Duration::from_secs(10));
    CredentialIssuanceClient::new(config, TrustContext::SystemDefault)
}

#[tokio::test]
async fn issue_round_trip() {
    let (url, request_rx) = serve_once(200, "OK", stub_certificate_pem(3600)).await;

    let key = SigningKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
    let csr = CsrBuilder::new().build(&key).unwrap();

    let mut client = stub_client(&url);
    client.open().unwrap();
    let cert = client
        .issue(&csr.to_pem(), &AuthToken::new("tok123"), 3600)
        .await
        .unwrap();
    assert_eq!(client.state(), ClientState::ResponseRead);
    client.close();

    assert_eq!(cert.subject(), "CN=jdoe@example.org, O=Stub CA, C=US");

    let request = request_rx.await.unwrap();
    assert!(request.starts_with("POST /issue HTTP/1.1"));
    assert!(request.contains("content-type: application/x-www-form-urlencoded"));
    assert!(request.contains("command=IssueCert"));
    assert!(request.contains("token=tok123"));
    assert!(request.contains("lifetime=3600"));
    assert!(request.contains("certificateRequest=-----BEGIN+CERTIFICATE+REQUEST-----%0A"));
}

#[tokio::test]
async fn zero_lifetime_is_omitted_from_the_form() {
    let (url, request_rx) = serve_once(200, "OK", stub_certificate_pem(600)).await;

    let mut client = stub_client(&url);
    client.open().unwrap();
    client
        .issue("request", &AuthToken::new("tok"), 0)
        .await
        .unwrap();

    let request = request_rx.await.unwrap();
    assert!(!request.contains("lifetime="));
}

#[tokio::test]
async fn authentication_failure_maps_from_401() {
    let (url, _request_rx) = serve_once(401, "Unauthorized", "token expired".into()).await;

    let mut client = stub_client(&url);
    client.open().unwrap();
    let result = client.issue("request", &AuthToken::new("tok"), 0).await;

    match result.unwrap_err() {
        Error::AuthenticationFailed(message) => assert_eq!(message, "token expired"),
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
    assert_eq!(client.state(), ClientState::Failed);
}

#[tokio::test]
async fn empty_success_body_is_an_error() {
    let (url, _request_rx) = serve_once(200, "OK", String::new()).await;

    let mut client = stub_client(&url);
    client.open().unwrap();
    let result = client.issue("request", &AuthToken::new("tok"), 0).await;

    assert!(matches!(result.unwrap_err(), Error::EmptyResponse));
}

#[tokio::test]
async fn insecure_url_issues_no_network_io() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // allow_plain_http is off: open() must fail before touching the socket.
    let config = IssuerConfig::new(&format!("http://{addr}/issue")).unwrap();
    let mut client = CredentialIssuanceClient::new(config, TrustContext::SystemDefault);
    assert!(matches!(
        client.open().unwrap_err(),
        Error::InsecureTransport(_)
    ));

    let waited = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(waited.is_err(), "no connection should have been attempted");
}

#[tokio::test]
async fn end_to_end_short_lived_credential() {
    // Stub issuer returns a certificate valid for one hour; the policy
    // allows two hours of cleartext lifetime, so a plain PEM file results.
    let (url, _request_rx) = serve_once(200, "OK", stub_certificate_pem(3600)).await;

    let key = SigningKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
    let csr = CsrBuilder::new().build(&key).unwrap();

    let mut client = stub_client(&url);
    client.open().unwrap();
    let cert = client
        .issue(&csr.to_pem(), &AuthToken::new("tok123"), 3600)
        .await
        .unwrap();
    client.close();

    let credential = Credential::new(key, cert);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proxy.pem");
    let policy = WritePolicy::new(Duration::from_secs(7200), 12);

    let outcome = credential.write_to_file(&path, None, &policy).unwrap();

    assert_eq!(outcome, WriteOutcome::Pem(path.clone()));
    assert!(!path.with_extension("p12").exists());

    let contents = std::fs::read_to_string(&path).unwrap();
    let blocks = gridcred_pki::pem::decode_all(&contents).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].label, gridcred_pki::pem::CERTIFICATE);
    assert_eq!(blocks[1].label, gridcred_pki::pem::PRIVATE_KEY);
}
