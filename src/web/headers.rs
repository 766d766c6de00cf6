//! Browser header sets for the four request shapes the site sees.

use rand::seq::IndexedRandom;
use reqwest::Url;

use super::{Method, RequestKind, WebRequest};

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:97.0) Gecko/20100101 Firefox/97.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.87 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.74 Safari/537.36",
];

/// Builds headers for a request. The user agent is fixed for the lifetime
/// of a session.
#[derive(Debug, Clone)]
pub struct HeaderFactory {
    user_agent: String,
}

impl HeaderFactory {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    /// Pick one of [`USER_AGENTS`] at random.
    pub fn random() -> Self {
        let agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        Self::new(agent)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Default headers for `request`, overridden by the request's own.
    pub fn build(&self, request: &WebRequest, referer: &str) -> Vec<(String, String)> {
        let mut headers: Vec<(&str, String)> = vec![
            ("User-Agent", self.user_agent.clone()),
            ("Accept-Language", ACCEPT_LANGUAGE.into()),
            ("Referer", referer.into()),
        ];

        match (request.method, request.kind) {
            (Method::Get, RequestKind::Document) => {
                headers.push(("Accept", ACCEPT_HTML.into()));
                headers.push(("Upgrade-Insecure-Requests", "1".into()));
                headers.push(("Sec-Fetch-Dest", "document".into()));
                headers.push(("Sec-Fetch-Mode", "navigate".into()));
                headers.push(("Sec-Fetch-Site", "same-site".into()));
                headers.push(("Sec-Fetch-User", "?1".into()));
            }
            (Method::Get, RequestKind::Xhr) => {
                headers.push((
                    "Accept",
                    "text/javascript, application/javascript, */*".into(),
                ));
                headers.push(("Content-Type", FORM_CONTENT_TYPE.into()));
                headers.push(("X-Requested-With", "XMLHttpRequest".into()));
                headers.push(("Sec-Fetch-Dest", "empty".into()));
                headers.push(("Sec-Fetch-Mode", "cors".into()));
                headers.push(("Sec-Fetch-Site", "same-origin".into()));
            }
            (Method::Post, RequestKind::Document) => {
                headers.push(("Accept", ACCEPT_HTML.into()));
                headers.push(("Content-Type", FORM_CONTENT_TYPE.into()));
                headers.push(("Origin", origin_of(&request.url)));
                headers.push(("Upgrade-Insecure-Requests", "1".into()));
                headers.push(("Sec-Fetch-Dest", "document".into()));
                headers.push(("Sec-Fetch-Mode", "navigate".into()));
                headers.push(("Sec-Fetch-Site", "same-origin".into()));
                headers.push(("Sec-Fetch-User", "?1".into()));
            }
            (Method::Post, RequestKind::Xhr) => {
                headers.push(("Accept", "*/*".into()));
                headers.push(("Content-Type", FORM_CONTENT_TYPE.into()));
                headers.push(("Origin", origin_of(&request.url)));
                headers.push(("X-Requested-With", "XMLHttpRequest".into()));
                headers.push(("Sec-Fetch-Dest", "empty".into()));
                headers.push(("Sec-Fetch-Mode", "cors".into()));
                headers.push(("Sec-Fetch-Site", "same-origin".into()));
            }
        }
        headers.push(("Sec-GPC", "1".into()));

        let mut merged: Vec<(String, String)> = headers
            .into_iter()
            .filter(|(name, _)| {
                !request
                    .headers
                    .iter()
                    .any(|(n, _)| n.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        merged.extend(request.headers.iter().cloned());
        merged
    }
}

/// `scheme://host` of a URL.
pub fn origin_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => format!("{}://{}", u.scheme(), u.host_str().unwrap_or_default()),
        Err(_) => url.to_string(),
    }
}

/// `scheme://host/path` of a URL, dropping the query string.
pub fn referrer_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => format!(
            "{}://{}{}",
            u.scheme(),
            u.host_str().unwrap_or_default(),
            u.path()
        ),
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn xhr_post_has_origin_and_requested_with() {
        let factory = HeaderFactory::new("agent");
        let req = WebRequest::post("https://online.hl.co.uk/my-accounts/manual_deal").xhr();
        let headers = factory.build(&req, "https://online.hl.co.uk/");
        assert_eq!(value(&headers, "Origin"), Some("https://online.hl.co.uk"));
        assert_eq!(value(&headers, "X-Requested-With"), Some("XMLHttpRequest"));
        assert_eq!(value(&headers, "Accept"), Some("*/*"));
    }

    #[test]
    fn document_get_navigates() {
        let factory = HeaderFactory::new("agent");
        let req = WebRequest::get("https://online.hl.co.uk/my-accounts");
        let headers = factory.build(&req, "https://online.hl.co.uk/");
        assert_eq!(value(&headers, "Sec-Fetch-Mode"), Some("navigate"));
        assert_eq!(value(&headers, "Origin"), None);
        assert_eq!(value(&headers, "User-Agent"), Some("agent"));
    }

    #[test]
    fn request_headers_override_defaults() {
        let factory = HeaderFactory::new("agent");
        let req = WebRequest::get("https://online.hl.co.uk/ajaxx/user.php")
            .xhr()
            .referer("https://online.hl.co.uk/my-accounts/security_deal/sedol/X");
        let headers = factory.build(&req, "https://online.hl.co.uk/");
        let referers: Vec<_> = headers.iter().filter(|(n, _)| n == "Referer").collect();
        assert_eq!(referers.len(), 1);
        assert!(referers[0].1.ends_with("/sedol/X"));
    }

    #[test]
    fn referrer_strips_query() {
        assert_eq!(
            referrer_of("https://online.hl.co.uk/my-accounts/x?a=1"),
            "https://online.hl.co.uk/my-accounts/x"
        );
        assert_eq!(origin_of("https://online.hl.co.uk/a/b"), "https://online.hl.co.uk");
    }

    #[test]
    fn random_agent_is_known() {
        let factory = HeaderFactory::random();
        assert!(USER_AGENTS.contains(&factory.user_agent()));
    }
}
