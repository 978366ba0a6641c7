//! Login and callback route handlers
//!
//! Only three routes exist: the legacy `/login` alias, `{prefix}/login` and
//! `{prefix}/callback`. Everything else is a 404.

use std::convert::Infallible;
use std::sync::Arc;

use http::{
    HeaderValue, Method,
    header::{ALLOW, CACHE_CONTROL, LOCATION, SET_COOKIE},
};
use http_body_util::Full;
use hyper::{Request, Response, StatusCode, body::Bytes};
use tracing::{info, instrument, warn};

use crate::bridge::LoginBridge;
use crate::error::BridgeError;
use crate::token::AuthorizationCode;

const LEGACY_LOGIN_PATH: &str = "/login";
/// Longest provider `error` value echoed into logs and the error page.
const MAX_PROVIDER_ERROR_LEN: usize = 64;

/// Return with a 404 Not Found response
pub(crate) fn respond_404() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("Not Found")));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn respond_405() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("Method Not Allowed")));
    *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET"));
    response
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    LegacyLogin,
    Login,
    Callback,
    NotFound,
}

/// What the callback needs from its query string; nothing else is kept.
#[derive(Debug, Default)]
struct CallbackParams {
    code: Option<AuthorizationCode>,
    error: Option<String>,
}

impl CallbackParams {
    fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" if params.code.is_none() && !value.is_empty() => {
                    params.code = Some(AuthorizationCode::new(value.into_owned()));
                }
                "error" if params.error.is_none() => {
                    params.error = Some(provider_error_code(&value));
                }
                _ => {}
            }
        }
        params
    }
}

/// Passes through an RFC 6749 error code, or a placeholder if the value isn't one.
fn provider_error_code(value: &str) -> String {
    let valid = !value.is_empty()
        && value.len() <= MAX_PROVIDER_ERROR_LEN
        && value
            .bytes()
            .all(|b| matches!(b, 0x20..=0x21 | 0x23..=0x5B | 0x5D..=0x7E));
    if valid {
        value.to_string()
    } else {
        "unrecognised error".to_string()
    }
}

/// Handler for the bridge's browser-facing routes
pub struct BridgeHandler {
    bridge: Arc<LoginBridge>,
    login_path: String,
    callback_path: String,
}

impl BridgeHandler {
    pub fn new(bridge: Arc<LoginBridge>, prefix: &str) -> Self {
        Self {
            bridge,
            login_path: format!("{prefix}/login"),
            callback_path: format!("{prefix}/callback"),
        }
    }

    fn route(&self, path: &str) -> Route {
        // With an empty prefix the prefixed login route is `/login` itself, so it wins over the alias.
        if path == self.login_path {
            Route::Login
        } else if path == LEGACY_LOGIN_PATH {
            Route::LegacyLogin
        } else if path == self.callback_path {
            Route::Callback
        } else {
            Route::NotFound
        }
    }

    #[instrument(level = "debug", skip_all, fields(method = %req.method(), path = req.uri().path()))]
    pub async fn handle_request<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>, Infallible>
    where
        B: Send,
    {
        let route = self.route(req.uri().path());
        if route == Route::NotFound {
            return Ok(respond_404());
        }
        if req.method() != Method::GET {
            return Ok(respond_405());
        }

        let result = match route {
            Route::LegacyLogin => self.handle_legacy_login(),
            Route::Login => self.handle_login().await,
            Route::Callback => {
                let params = CallbackParams::from_query(req.uri().query().unwrap_or(""));
                drop(req);
                self.handle_callback(params).await
            }
            Route::NotFound => Ok(respond_404()),
        };

        Ok(result.unwrap_or_else(|err| {
            warn!(stage = err.stage(), error = %err, "Request failed");
            err.into()
        }))
    }

    /// GET /login - Permanent redirect to the prefixed login route
    fn handle_legacy_login(&self) -> Result<Response<Full<Bytes>>, BridgeError> {
        Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(LOCATION, self.login_path.as_str())
            .body(Full::new(Bytes::new()))
            .map_err(BridgeError::from)
    }

    /// GET {prefix}/login - Redirect to the OIDC provider
    async fn handle_login(&self) -> Result<Response<Full<Bytes>>, BridgeError> {
        let auth_url = self.bridge.authorization_url().await?;

        Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, auth_url.as_str())
            .header(CACHE_CONTROL, "no-store")
            .body(Full::new(Bytes::new()))
            .map_err(BridgeError::from)
    }

    /// GET {prefix}/callback - Trade the code for a Filestash session and send the browser home
    async fn handle_callback(
        &self,
        params: CallbackParams,
    ) -> Result<Response<Full<Bytes>>, BridgeError> {
        if let Some(error) = params.error {
            return Err(BridgeError::TokenExchange(format!(
                "Provider returned '{error}' instead of an authorization code"
            )));
        }

        let code = params.code.ok_or(BridgeError::MissingCode)?;

        let cookie = self.bridge.complete_login(code).await?;

        let mut builder = Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, "/")
            .header(CACHE_CONTROL, "no-store");
        for value in cookie.into_header_values() {
            builder = builder.header(SET_COOKIE, value);
        }
        let response = builder
            .body(Full::new(Bytes::new()))
            .map_err(BridgeError::from)?;

        info!("Callback complete, redirecting to /");
        Ok(response)
    }
}
