//! Browser-like HTTP plumbing: request model, header sets, cookies,
//! traffic recording and the blocking transport.

pub mod cookies;
pub mod headers;
pub mod mock;
pub mod recorder;
pub mod transport;

use crate::error::Result;

pub use cookies::Cookie;

/// Site root.
pub const BASE_URL: &str = "https://online.hl.co.uk";

/// HTTP method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Which browser header set a request carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Full page navigation or form submission.
    Document,
    /// `XMLHttpRequest` issued by page scripts.
    Xhr,
}

/// A request as the site's pages would issue it.
///
/// `params` become the query string for GETs and the urlencoded form body
/// for POSTs. Order is preserved on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct WebRequest {
    pub method: Method,
    pub url: String,
    pub kind: RequestKind,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl WebRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            kind: RequestKind::Document,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn xhr(mut self) -> Self {
        self.kind = RequestKind::Xhr;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn referer(self, url: impl Into<String>) -> Self {
        self.header("Referer", url)
    }

    /// First value of a query/form parameter.
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Final URL (after redirects), status and body of a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl WebResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// True when the body mentions `phrase` (case-sensitive).
    pub fn contains(&self, phrase: &str) -> bool {
        self.body.contains(phrase)
    }
}

/// A cookie-carrying HTTP session.
pub trait WebSession {
    fn send(&self, request: &WebRequest) -> Result<WebResponse>;

    fn add_cookie(&self, cookie: Cookie);

    fn cookies(&self) -> Vec<Cookie>;

    /// Drop every cookie and reinstate the anonymous defaults.
    fn reset_cookies(&self);
}

impl<T: WebSession + ?Sized> WebSession for &T {
    fn send(&self, request: &WebRequest) -> Result<WebResponse> {
        (**self).send(request)
    }

    fn add_cookie(&self, cookie: Cookie) {
        (**self).add_cookie(cookie)
    }

    fn cookies(&self) -> Vec<Cookie> {
        (**self).cookies()
    }

    fn reset_cookies(&self) {
        (**self).reset_cookies()
    }
}

/// Full URL for a site-relative `path`.
pub fn site_url(path: &str) -> String {
    format!("{BASE_URL}{path}")
}

/// Referer used by the dealing pages of one security.
pub fn security_deal_referer(sedol: &str) -> String {
    site_url(&format!("/my-accounts/security_deal/sedol/{sedol}"))
}
