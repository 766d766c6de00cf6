//! Mock session for testing: replays canned responses in order and records
//! every request for assertions, without network calls.
//!
//! ```ignore
//! use hargreaves::web::mock::MockSession;
//!
//! let session = MockSession::new()
//!     .respond(200, "<html>accounts</html>")
//!     .redirect_to_login("<input name=\"hl_vt\" value=\"1\">");
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::cookies::{self, Cookie};
use super::{WebRequest, WebResponse, WebSession};
use crate::auth::LOGIN_URL;
use crate::error::{Error, Result};

#[derive(Clone, Debug)]
struct Reply {
    status: u16,
    final_url: Option<String>,
    body: String,
}

/// Replies are consumed in order, one per request.
#[derive(Debug, Default)]
pub struct MockSession {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<WebRequest>>,
    cookies: Mutex<Vec<Cookie>>,
}

impl MockSession {
    pub fn new() -> Self {
        let session = Self::default();
        session.reset_cookies();
        session
    }

    /// Reply with `status` and `body`, landing on the requested URL.
    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Reply {
            status,
            final_url: None,
            body: body.into(),
        })
    }

    /// Reply `200 OK` with `body`.
    pub fn ok(self, body: impl Into<String>) -> Self {
        self.respond(200, body)
    }

    /// Reply as though the site redirected the request to `url`.
    pub fn respond_at(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.push(Reply {
            status: 200,
            final_url: Some(url.into()),
            body: body.into(),
        })
    }

    /// Reply as though the session had expired and the site bounced the
    /// request to the login page.
    pub fn redirect_to_login(self, body: impl Into<String>) -> Self {
        self.respond_at(LOGIN_URL, body)
    }

    fn push(self, reply: Reply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<WebRequest> {
        lock(&self.requests).clone()
    }

    /// URLs of every request sent so far.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.url.clone()).collect()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WebSession for MockSession {
    fn send(&self, request: &WebRequest) -> Result<WebResponse> {
        lock(&self.requests).push(request.clone());
        let reply = lock(&self.replies).pop_front().ok_or_else(|| {
            Error::Transport(format!("no scripted reply for {}", request.url))
        })?;
        Ok(WebResponse {
            url: reply.final_url.unwrap_or_else(|| request.url.clone()),
            status: reply.status,
            body: reply.body,
        })
    }

    fn add_cookie(&self, cookie: Cookie) {
        let mut jar = lock(&self.cookies);
        jar.retain(|c| c.name != cookie.name);
        jar.push(cookie);
    }

    fn cookies(&self) -> Vec<Cookie> {
        lock(&self.cookies).clone()
    }

    fn reset_cookies(&self) {
        *lock(&self.cookies) = cookies::default_cookies(0, 520_000);
    }
}
