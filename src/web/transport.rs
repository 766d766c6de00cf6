//! Blocking HTTP transport with a cookie jar, browser headers, bounded
//! retry and traffic recording.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use rand::Rng;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore as _, Jar};

use super::cookies::{self, Cookie};
use super::headers::HeaderFactory;
use super::recorder::{HttpExchange, RequestRecorder};
use super::{BASE_URL, Method, WebRequest, WebResponse, WebSession};
use crate::error::{Error, Result};
use crate::pacing::current_timestamp_ms;

/// Timeout and retry policy for the transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connect and read timeout.
    pub timeout: Duration,
    /// Extra attempts after a connection-level failure.
    pub retry_count: u32,
    /// Fixed delay between attempts.
    pub retry_backoff: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            retry_count: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

struct ClientState {
    client: Client,
    jar: Arc<Jar>,
}

/// The real session: a reqwest blocking client sharing one cookie jar.
pub struct HttpSession {
    config: TransportConfig,
    headers: HeaderFactory,
    state: Mutex<ClientState>,
    recorder: RequestRecorder,
    site: Url,
}

impl HttpSession {
    /// Create a session carrying the anonymous default cookies.
    pub fn new(config: TransportConfig) -> Result<Self> {
        let site = Url::parse(&format!("{BASE_URL}/"))
            .map_err(|e| Error::Transport(format!("invalid site URL: {e}")))?;
        let state = build_state(&config)?;
        let session = Self {
            config,
            headers: HeaderFactory::random(),
            state: Mutex::new(state),
            recorder: RequestRecorder::new(),
            site,
        };
        session.add_default_cookies();
        debug!("HTTP session ready (user agent: {})", session.headers.user_agent());
        Ok(session)
    }

    pub fn recorder(&self) -> &RequestRecorder {
        &self.recorder
    }

    fn add_default_cookies(&self) {
        let window_id = rand::rng().random_range(520_000..750_000);
        for cookie in cookies::default_cookies(current_timestamp_ms(), window_id) {
            self.add_cookie(cookie);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(
        &self,
        request: &WebRequest,
        headers: &[(String, String)],
    ) -> std::result::Result<WebResponse, reqwest::Error> {
        let client = self.lock().client.clone();
        let mut builder = match request.method {
            Method::Get => client.get(&request.url).query(&request.params),
            Method::Post => client.post(&request.url).form(&request.params),
        };
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.send()?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(WebResponse { url, status, body })
    }

    /// Only failures where the request cannot have reached the site are
    /// retried for POSTs. GETs also retry on timeouts and on connections
    /// dropped mid-exchange.
    fn is_retryable(method: Method, err: &reqwest::Error) -> bool {
        match method {
            Method::Get => {
                err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
            }
            Method::Post => err.is_connect(),
        }
    }
}

fn build_state(config: &TransportConfig) -> Result<ClientState> {
    let jar = Arc::new(Jar::default());
    let client = Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .timeout(config.timeout)
        .connect_timeout(config.timeout)
        .build()
        .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))?;
    Ok(ClientState { client, jar })
}

impl WebSession for HttpSession {
    fn send(&self, request: &WebRequest) -> Result<WebResponse> {
        let referer = self.recorder.last_referer();
        let headers = self.headers.build(request, &referer);
        let started = Utc::now();

        let mut attempt = 0;
        let response = loop {
            match self.execute(request, &headers) {
                Ok(response) => break response,
                Err(e) if attempt < self.config.retry_count && Self::is_retryable(request.method, &e) => {
                    attempt += 1;
                    warn!(
                        "{} {} failed ({e}), retry {attempt}/{}",
                        request.method.as_str(),
                        request.url,
                        self.config.retry_count
                    );
                    std::thread::sleep(self.config.retry_backoff);
                }
                Err(e) => {
                    return Err(Error::Transport(format!(
                        "{} {} failed: {e}",
                        request.method.as_str(),
                        request.url
                    )));
                }
            }
        };

        debug!(
            "{} {} -> {} ({})",
            request.method.as_str(),
            request.url,
            response.status,
            response.url
        );
        self.recorder
            .record(HttpExchange::new(request, headers, &response, started));
        Ok(response)
    }

    fn add_cookie(&self, cookie: Cookie) {
        self.lock()
            .jar
            .add_cookie_str(&cookie.to_set_cookie(), &self.site);
    }

    fn cookies(&self) -> Vec<Cookie> {
        let header = self.lock().jar.cookies(&self.site);
        header
            .as_ref()
            .and_then(|h| h.to_str().ok())
            .map(parse_cookie_header)
            .unwrap_or_default()
    }

    fn reset_cookies(&self) {
        match build_state(&self.config) {
            Ok(state) => {
                *self.lock() = state;
                self.add_default_cookies();
                debug!("Cookie jar reset to anonymous defaults");
            }
            Err(e) => warn!("could not reset cookie jar: {e}"),
        }
    }
}

/// Split a `Cookie:` header (`a=1; b=2`) into site cookies.
fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split("; ")
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| Cookie::new(name.trim(), value))
        .collect()
}
