//! Append-only record of HTTP exchanges, exportable as a HAR archive or a
//! markdown walkthrough. Purely observational.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Url;
use serde_json::{Value, json};

use super::headers::referrer_of;
use super::{BASE_URL, Method, WebRequest, WebResponse};
use crate::error::{Error, Result};

const MASK: &str = "********";

/// Form parameters whose values are always masked, matched by name prefix.
const SENSITIVE_PARAMS: &[&str] = &["secure-number["];

/// Response bodies longer than this are cut in markdown output.
const MARKDOWN_BODY_LIMIT: usize = 2_000;

/// URL fragments that are noise in a dealing walkthrough.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    ".js", ".css", ".jpg", ".png", ".gif", ".svg", ".ico", "googleads", "google.com",
    "facebook", "youtube", "twitter", "fonts", "bing.com", "demdex.net", "omtrdc.net",
    "loginstatus", "lightstreamer", "cms_services.php", "ajax/menus",
];

/// One request/response pair.
#[derive(Clone, Debug)]
pub struct HttpExchange {
    pub started: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub method: Method,
    pub url: String,
    pub request_headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub response_url: String,
    pub status: u16,
    pub response_body: String,
}

impl HttpExchange {
    pub fn new(
        request: &WebRequest,
        headers: Vec<(String, String)>,
        response: &WebResponse,
        started: DateTime<Utc>,
    ) -> Self {
        let elapsed_ms = (Utc::now() - started).num_milliseconds().max(0) as u64;
        Self {
            started,
            elapsed_ms,
            method: request.method,
            url: request.url.clone(),
            request_headers: headers,
            params: request.params.clone(),
            response_url: response.url.clone(),
            status: response.status,
            response_body: response.body.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestRecorder {
    entries: Mutex<Vec<HttpExchange>>,
}

impl RequestRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, exchange: HttpExchange) {
        self.lock().push(exchange);
    }

    pub fn entries(&self) -> Vec<HttpExchange> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Referer a browser would send next: the last page (not AJAX) URL
    /// without its query string, or the site root.
    pub fn last_referer(&self) -> String {
        self.lock()
            .iter()
            .rev()
            .find(|e| !e.response_url.contains("ajaxx"))
            .map(|e| referrer_of(&e.response_url))
            .unwrap_or_else(|| format!("{BASE_URL}/"))
    }

    /// HAR 1.2 document with every `sensitive` value masked.
    pub fn to_har(&self, sensitive: &[&str]) -> Value {
        let entries: Vec<Value> = self
            .lock()
            .iter()
            .map(|e| har_entry(e, sensitive))
            .collect();
        json!({
            "log": {
                "version": "1.2",
                "creator": {"name": "hargreaves", "version": env!("CARGO_PKG_VERSION")},
                "entries": entries,
            }
        })
    }

    /// Write the HAR document to `path`, creating parent directories.
    pub fn save_har(&self, path: &Path, sensitive: &[&str]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let har = self.to_har(sensitive);
        fs::write(path, serde_json::to_string_pretty(&har)?)?;
        debug!("Wrote {} exchanges to {}", self.len(), path.display());
        Ok(())
    }

    /// Markdown walkthrough of the recorded traffic.
    pub fn render_markdown(&self, sensitive: &[&str]) -> String {
        let har = self.to_har(sensitive);
        let entries = har["log"]["entries"].as_array().cloned().unwrap_or_default();
        render_entries(&entries)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HttpExchange>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Render a HAR document (as saved by [`RequestRecorder::save_har`] or by a
/// browser) as markdown, skipping entries whose URL contains any of
/// `exclude`.
pub fn har_to_markdown(har_json: &str, exclude: &[&str]) -> Result<String> {
    let har: Value = serde_json::from_str(har_json)?;
    let entries = har["log"]["entries"]
        .as_array()
        .ok_or_else(|| Error::parse("HAR archive", "missing log.entries"))?;
    let kept: Vec<Value> = entries
        .iter()
        .filter(|e| {
            let url = e["request"]["url"].as_str().unwrap_or_default();
            !exclude.iter().any(|pattern| url.contains(pattern))
        })
        .cloned()
        .collect();
    Ok(render_entries(&kept))
}

fn render_entries(entries: &[Value]) -> String {
    let mut out = String::from("# HTTP session\n");
    for (i, entry) in entries.iter().enumerate() {
        let request = &entry["request"];
        let response = &entry["response"];
        let method = request["method"].as_str().unwrap_or("GET");
        let url = request["url"].as_str().unwrap_or_default();

        let _ = writeln!(out, "\n## {}. {method} {}\n", i + 1, path_of(url));
        let _ = writeln!(out, "- URL: `{url}`");
        let _ = writeln!(out, "- Status: {}", response["status"]);
        if let Some(started) = entry["startedDateTime"].as_str() {
            let _ = writeln!(out, "- Started: {started}");
        }

        let query = name_values(&request["queryString"]);
        if !query.is_empty() {
            out.push_str("\n### Query\n\n| Name | Value |\n|------|-------|\n");
            for (name, value) in &query {
                let _ = writeln!(out, "| {name} | {value} |");
            }
        }

        let form = name_values(&request["postData"]["params"]);
        if !form.is_empty() {
            out.push_str("\n### Form\n\n| Name | Value |\n|------|-------|\n");
            for (name, value) in &form {
                let _ = writeln!(out, "| {name} | {value} |");
            }
        }

        let body = response["content"]["text"].as_str().unwrap_or_default();
        if !body.is_empty() {
            let cut: String = body.chars().take(MARKDOWN_BODY_LIMIT).collect();
            let _ = writeln!(out, "\n### Response\n\n```\n{cut}\n```");
            if cut.len() < body.len() {
                let _ = writeln!(out, "\n_({} bytes truncated)_", body.len() - cut.len());
            }
        }
    }
    out
}

fn name_values(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|p| {
                    (
                        p["name"].as_str().unwrap_or_default().to_string(),
                        p["value"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn path_of(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

fn mask(text: &str, sensitive: &[&str]) -> String {
    sensitive
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, s| acc.replace(s, MASK))
}

fn mask_param(name: &str, value: &str, sensitive: &[&str]) -> String {
    if SENSITIVE_PARAMS.iter().any(|prefix| name.starts_with(prefix)) {
        MASK.to_string()
    } else {
        mask(value, sensitive)
    }
}

fn pairs_json(pairs: &[(String, String)], sensitive: &[&str]) -> Vec<Value> {
    pairs
        .iter()
        .map(|(k, v)| json!({"name": k, "value": mask(v, sensitive)}))
        .collect()
}

fn params_json(params: &[(String, String)], sensitive: &[&str]) -> Vec<Value> {
    params
        .iter()
        .map(|(k, v)| json!({"name": k, "value": mask_param(k, v, sensitive)}))
        .collect()
}

fn har_entry(e: &HttpExchange, sensitive: &[&str]) -> Value {
    let mut request = json!({
        "method": e.method.as_str(),
        "url": e.url,
        "httpVersion": "HTTP/1.1",
        "headers": pairs_json(&e.request_headers, sensitive),
        "queryString": [],
        "cookies": [],
        "headersSize": -1,
        "bodySize": -1,
    });
    match e.method {
        Method::Get => {
            request["queryString"] = Value::Array(params_json(&e.params, sensitive));
        }
        Method::Post => {
            let masked: Vec<(String, String)> = e
                .params
                .iter()
                .map(|(k, v)| (k.clone(), mask_param(k, v, sensitive)))
                .collect();
            let text = Url::parse_with_params(BASE_URL, &masked)
                .ok()
                .and_then(|u| u.query().map(str::to_string))
                .unwrap_or_default();
            request["postData"] = json!({
                "mimeType": "application/x-www-form-urlencoded",
                "params": pairs_json(&masked, &[]),
                "text": text,
            });
        }
    }

    let body = mask(&e.response_body, sensitive);
    let redirect_url = if e.response_url != e.url {
        e.response_url.clone()
    } else {
        String::new()
    };
    json!({
        "startedDateTime": e.started.to_rfc3339(),
        "time": e.elapsed_ms,
        "request": request,
        "response": {
            "status": e.status,
            "statusText": "",
            "httpVersion": "HTTP/1.1",
            "headers": [],
            "cookies": [],
            "content": {"size": body.len(), "mimeType": "text/html", "text": body},
            "redirectURL": redirect_url,
            "headersSize": -1,
            "bodySize": -1,
        },
        "cache": {},
        "timings": {"send": 0, "wait": e.elapsed_ms, "receive": 0},
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(request: WebRequest, response_url: &str, body: &str) -> HttpExchange {
        let response = WebResponse {
            url: response_url.into(),
            status: 200,
            body: body.into(),
        };
        HttpExchange::new(&request, Vec::new(), &response, Utc::now())
    }

    #[test]
    fn referer_skips_ajax_and_query() {
        let recorder = RequestRecorder::new();
        assert_eq!(recorder.last_referer(), "https://online.hl.co.uk/");

        recorder.record(exchange(
            WebRequest::get("https://online.hl.co.uk/my-accounts?x=1"),
            "https://online.hl.co.uk/my-accounts?x=1",
            "",
        ));
        recorder.record(exchange(
            WebRequest::get("https://online.hl.co.uk/ajaxx/user.php"),
            "https://online.hl.co.uk/ajaxx/user.php",
            "",
        ));
        assert_eq!(recorder.last_referer(), "https://online.hl.co.uk/my-accounts");
    }

    #[test]
    fn har_masks_sensitive_values() {
        let recorder = RequestRecorder::new();
        recorder.record(exchange(
            WebRequest::post("https://online.hl.co.uk/my-accounts/login-step-one")
                .param("username", "jbloggs")
                .param("date-of-birth", "010180"),
            "https://online.hl.co.uk/my-accounts/login-step-one",
            "<p>Welcome jbloggs</p>",
        ));

        let har = recorder.to_har(&["jbloggs", "010180"]);
        let text = har.to_string();
        assert!(!text.contains("jbloggs"));
        assert!(!text.contains("010180"));
        assert_eq!(
            har["log"]["entries"][0]["request"]["postData"]["params"][0]["value"],
            MASK
        );
    }

    #[test]
    fn har_masks_secure_number_digits_by_name() {
        let recorder = RequestRecorder::new();
        recorder.record(exchange(
            WebRequest::post("https://online.hl.co.uk/my-accounts/login-step-two")
                .param("online-password-verification", "hunter2")
                .param("secure-number[1]", "9")
                .param("secure-number[2]", "8")
                .param("secure-number[3]", "3"),
            "https://online.hl.co.uk/my-accounts",
            "",
        ));

        let har = recorder.to_har(&["jbloggs", "hunter2", "010170", "918273"]);
        let post = &har["log"]["entries"][0]["request"]["postData"];
        let params = post["params"].as_array().unwrap();
        assert_eq!(params.len(), 4);
        for param in params {
            assert_eq!(param["value"], MASK, "{} leaked", param["name"]);
        }
        let text = post["text"].as_str().unwrap();
        assert!(!text.contains("=9"));
        assert!(!text.contains("=8"));
        assert!(!text.contains("=3"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn markdown_lists_every_exchange() {
        let recorder = RequestRecorder::new();
        recorder.record(exchange(
            WebRequest::get("https://online.hl.co.uk/ajaxx/stocks.php").param("sq", "LLOY"),
            "https://online.hl.co.uk/ajaxx/stocks.php",
            "jsonp1({})",
        ));
        let md = recorder.render_markdown(&[]);
        assert!(md.contains("## 1. GET /ajaxx/stocks.php"));
        assert!(md.contains("| sq | LLOY |"));
    }

    #[test]
    fn har_to_markdown_filters() {
        let har = r#"{"log":{"entries":[
            {"request":{"method":"GET","url":"https://online.hl.co.uk/app.js"},"response":{"status":200}},
            {"request":{"method":"GET","url":"https://online.hl.co.uk/my-accounts"},"response":{"status":200}}
        ]}}"#;
        let md = har_to_markdown(har, DEFAULT_EXCLUDE).unwrap();
        assert!(md.contains("GET /my-accounts"));
        assert!(!md.contains("app.js"));
        assert!(har_to_markdown("{}", &[]).is_err());
    }
}
