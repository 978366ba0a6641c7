//! Centralized error types for the bridge.
//!
//! Messages carried by [`BridgeError`] end up in logs and on the browser's
//! error page, so they must never contain codes, tokens, keys or cookies.

use askama::Template;
use http::{
    HeaderValue, Response, StatusCode,
    header::{CACHE_CONTROL, CONTENT_TYPE},
};
use http_body_util::Full;
use hyper::body::Bytes;

/// Error page template
#[derive(Template)]
#[template(path = "error.html")]
pub(crate) struct ErrorTemplate {
    pub(crate) status: u16,
    pub(crate) error_message: String,
}

#[derive(Debug)]
pub enum BridgeError {
    /// Bad startup settings, or an unreachable/malformed discovery document.
    Configuration(String),
    /// The provider refused the code or sent back something without an access token.
    TokenExchange(String),
    /// The storage service refused the token or returned incomplete credentials.
    Federation(String),
    /// Filestash refused the credentials or didn't set a cookie.
    SessionCreation(String),
    MissingCode,
    HttpResponseError(String),
    Io(std::io::Error),
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Configuration(msg) => write!(f, "Configuration Error: {}", msg),
            BridgeError::TokenExchange(msg) => write!(f, "Token Exchange Error: {}", msg),
            BridgeError::Federation(msg) => write!(f, "Federation Error: {}", msg),
            BridgeError::SessionCreation(msg) => write!(f, "Session Creation Error: {}", msg),
            BridgeError::MissingCode => {
                f.write_str("Missing 'code' parameter in OIDC callback")
            }
            BridgeError::HttpResponseError(msg) => write!(f, "HTTP Response Error: {}", msg),
            BridgeError::Io(e) => write!(f, "IO Error: {:?}", e),
        }
    }
}

impl std::error::Error for BridgeError {}

impl BridgeError {
    /// Which part of the login flow failed, for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            BridgeError::Configuration(_) => "discovery",
            BridgeError::TokenExchange(_) => "token_exchange",
            BridgeError::Federation(_) => "federation",
            BridgeError::SessionCreation(_) => "session_creation",
            BridgeError::MissingCode => "callback",
            BridgeError::HttpResponseError(_) | BridgeError::Io(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::MissingCode => StatusCode::BAD_REQUEST,
            BridgeError::Configuration(_)
            | BridgeError::TokenExchange(_)
            | BridgeError::Federation(_)
            | BridgeError::SessionCreation(_) => StatusCode::BAD_GATEWAY,
            BridgeError::HttpResponseError(_) | BridgeError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Describes a `reqwest` failure without the request URL, which may carry the
/// web identity token or the Filestash API key in its query string.
pub(crate) fn describe_reqwest_error(err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_decode() || err.is_body() {
        "unreadable response body"
    } else {
        "request failed"
    };
    format!("{kind}: {}", err.without_url())
}

/// Describes a JSON failure by position only; serde messages can quote the offending value.
pub(crate) fn describe_json_error(err: &serde_json::Error) -> String {
    format!(
        "{:?} error at line {} column {}",
        err.classify(),
        err.line(),
        err.column()
    )
}

impl From<http::Error> for BridgeError {
    fn from(err: http::Error) -> Self {
        BridgeError::HttpResponseError(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err)
    }
}

impl From<BridgeError> for Response<Full<Bytes>> {
    fn from(err: BridgeError) -> Response<Full<Bytes>> {
        let status = err.status_code();
        let template = ErrorTemplate {
            status: status.as_u16(),
            error_message: err.to_string(),
        };

        let (body, content_type) = match template.render() {
            Ok(html) => (html, "text/html; charset=utf-8"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render error template");
                (err.to_string(), "text/plain; charset=utf-8")
            }
        };

        let mut res = Response::new(Full::new(Bytes::from(body)));
        *res.status_mut() = status;
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        res.headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        res
    }
}
