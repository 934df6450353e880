//! The credential-issuance wire protocol.
//!
//! One client owns one exchange with the issuing service: a single form POST
//! carrying the PEM CSR, the bearer token, and the requested lifetime, and a
//! single response carrying the issued certificate. There are no retries at
//! this layer; a failed issuance is surfaced to the caller.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header;
use tracing::{debug, info};
use url::Url;

use gridcred_pki::IssuedCertificate;

use crate::error::{Error, Result};
use crate::trust::TrustContext;

/// Form field selecting the issuance operation.
const FIELD_COMMAND: &str = "command";

/// Value of the command field.
const COMMAND_ISSUE: &str = "IssueCert";

/// Form field carrying the PEM certification request.
const FIELD_CSR: &str = "certificateRequest";

/// Form field carrying the requested lifetime in decimal seconds.
const FIELD_LIFETIME: &str = "lifetime";

/// Default name of the form field carrying the bearer token. The exact name
/// is a server contract; see [`IssuerConfig::with_token_field`].
const DEFAULT_TOKEN_FIELD: &str = "token";

/// An opaque single-use bearer token.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}

/// Configuration for the issuance client.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Service URL.
    url: Url,
    /// Name of the form field carrying the bearer token.
    token_field: String,
    /// Optional request timeout; `None` leaves timing to the caller.
    timeout: Option<Duration>,
    /// Permit `http` URLs. Intended for tests against loopback stub
    /// servers; leave off everywhere else.
    allow_plain_http: bool,
}

impl IssuerConfig {
    /// Creates a configuration for the given service URL.
    ///
    /// The scheme is checked when the connection is opened, not here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self {
            url,
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            timeout: None,
            allow_plain_http: false,
        })
    }

    /// Overrides the name of the token form field.
    #[must_use]
    pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }

    /// Sets a request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Permits plain-http URLs. Intended for tests only.
    #[must_use]
    pub const fn allow_plain_http(mut self, allow: bool) -> Self {
        self.allow_plain_http = allow;
        self
    }

    /// Returns the service URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

/// Protocol states of the issuance client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No connection prepared yet.
    Idle,
    /// TLS client built, ready to send.
    Connected,
    /// Request has been posted.
    RequestSent,
    /// Response has been read.
    ResponseRead,
    /// Connection released.
    Closed,
    /// An exchange failed; the client will not be reused.
    Failed,
}

/// Client for the credential-issuance exchange.
pub struct CredentialIssuanceClient {
    /// Client configuration.
    config: IssuerConfig,
    /// CA set applied to the connection.
    trust: TrustContext,
    /// HTTP client, present between `open` and `close`.
    http: Option<reqwest::Client>,
    /// Current protocol state.
    state: ClientState,
}

impl CredentialIssuanceClient {
    /// Creates a new client. No connection is made until [`Self::open`].
    #[must_use]
    pub const fn new(config: IssuerConfig, trust: TrustContext) -> Self {
        Self {
            config,
            trust,
            http: None,
            state: ClientState::Idle,
        }
    }

    /// Returns the current protocol state.
    #[must_use]
    pub const fn state(&self) -> ClientState {
        self.state
    }

    /// Validates the service URL and prepares the TLS client.
    ///
    /// A non-https URL is rejected before any network I/O happens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsecureTransport`] for a non-https URL and
    /// [`Error::Transport`] if the TLS client cannot be built.
    pub fn open(&mut self) -> Result<()> {
        let scheme = self.config.url.scheme();
        if scheme != "https" && !(self.config.allow_plain_http && scheme == "http") {
            self.state = ClientState::Failed;
            return Err(Error::InsecureTransport(scheme.to_string()));
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("gridcred/", env!("CARGO_PKG_VERSION")));
        builder = self.trust.apply(builder);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            self.state = ClientState::Failed;
            Error::Transport(format!("could not build TLS client: {e}"))
        })?;

        debug!("Prepared connection to {}", self.config.url);
        self.http = Some(client);
        self.state = ClientState::Connected;

        Ok(())
    }

    /// Posts the certification request and reads back the issued
    /// certificate.
    ///
    /// A `lifetime_secs` of zero leaves the lifetime to the server default
    /// and omits the field from the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before [`Self::open`], a mapped
    /// protocol error for non-2xx statuses, [`Error::EmptyResponse`] for a
    /// success status without a body, and a parse error if the body is not
    /// a certificate.
    pub async fn issue(
        &mut self,
        csr_pem: &str,
        token: &AuthToken,
        lifetime_secs: u64,
    ) -> Result<IssuedCertificate> {
        let http = self.http.as_ref().ok_or(Error::NotConnected)?.clone();

        let mut form: Vec<(&str, &str)> = vec![
            (FIELD_COMMAND, COMMAND_ISSUE),
            (self.config.token_field.as_str(), token.as_str()),
            (FIELD_CSR, csr_pem),
        ];
        let lifetime = lifetime_secs.to_string();
        if lifetime_secs > 0 {
            form.push((FIELD_LIFETIME, lifetime.as_str()));
        }

        debug!("POSTing certification request to {}", self.config.url);
        self.state = ClientState::RequestSent;

        let response = http
            .post(self.config.url.clone())
            .header(header::ACCEPT, "text/plain")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                self.state = ClientState::Failed;
                Error::Transport(format!("request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            self.state = ClientState::Failed;
            Error::Transport(format!("reading response failed: {e}"))
        })?;
        self.state = ClientState::ResponseRead;

        match parse_response(status, &body) {
            Ok(certificate) => {
                info!("Received certificate for {}", certificate.subject());
                Ok(certificate)
            }
            Err(e) => {
                self.state = ClientState::Failed;
                Err(e)
            }
        }
    }

    /// Releases the connection. Idempotent.
    pub fn close(&mut self) {
        if self.http.take().is_some() {
            debug!("Disconnected from {}", self.config.url);
        }
        self.state = ClientState::Closed;
    }
}

impl std::fmt::Debug for CredentialIssuanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuanceClient")
            .field("url", &self.config.url.as_str())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Maps a status/body pair onto the protocol result.
///
/// The protocol never legitimately answers success with an empty body, so
/// that case is an error rather than a missing certificate.
fn parse_response(status: StatusCode, body: &str) -> Result<IssuedCertificate> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }
        return Ok(IssuedCertificate::from_pem(body)?);
    }

    let message = body.trim().to_string();
    Err(match status {
        StatusCode::UNAUTHORIZED => Error::AuthenticationFailed(message),
        StatusCode::BAD_REQUEST => Error::MalformedRequest(message),
        s if s.is_server_error() => Error::ServerError(message),
        s => Error::UnexpectedStatus {
            status: s.as_u16(),
            message,
        },
    })
}
