//! Just enough HTML scanning for the site's server-rendered pages: opening
//! tags with attributes, matching element bodies, text content and tables.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)\b((?:[^>\x22']|\x22[^\x22]*\x22|'[^']*')*)>")
        .expect("open tag regex is valid")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute regex is valid")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x?[0-9a-fA-F]+);").expect("entity regex is valid"));

/// An opening tag located in a document.
#[derive(Clone, Debug)]
pub(crate) struct Tag {
    pub name: String,
    attrs: Vec<(String, String)>,
    /// Byte offset of `<`.
    pub start: usize,
    /// Byte offset just past `>`.
    pub end: usize,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn id_is(&self, id: &str) -> bool {
        self.attr("id") == Some(id)
    }
}

/// Every opening tag, in document order.
pub(crate) fn all_tags(html: &str) -> Vec<Tag> {
    OPEN_TAG
        .captures_iter(html)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let attrs = cap
                .get(2)
                .map(|a| parse_attrs(a.as_str()))
                .unwrap_or_default();
            Some(Tag {
                name,
                attrs,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Opening tags named `name`.
pub(crate) fn tags(html: &str, name: &str) -> Vec<Tag> {
    all_tags(html)
        .into_iter()
        .filter(|t| t.name == name)
        .collect()
}

/// First `name` tag satisfying `pred`.
pub(crate) fn find(html: &str, name: &str, pred: impl Fn(&Tag) -> bool) -> Option<Tag> {
    tags(html, name).into_iter().find(|t| pred(t))
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR.captures_iter(raw)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// Body of the element opened by `tag`, up to its matching close tag (or
/// the end of the document when unclosed).
pub(crate) fn inner<'h>(html: &'h str, tag: &Tag) -> &'h str {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag.name);
    let close = format!("</{}", tag.name);
    let mut depth = 1usize;
    let mut pos = tag.end;

    while depth > 0 {
        let next_open = find_tag_start(&lower, &open, pos);
        let Some(next_close) = find_tag_start(&lower, &close, pos) else {
            return &html[tag.end..];
        };
        match next_open {
            Some(o) if o < next_close => {
                depth += 1;
                pos = o + open.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return &html[tag.end..next_close];
                }
                pos = next_close + close.len();
            }
        }
    }
    &html[tag.end..]
}

/// Next `<name` (or `</name`) at a tag-name boundary.
fn find_tag_start(lower: &str, prefix: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(i) = lower.get(pos..)?.find(prefix) {
        let at = pos + i;
        let after = lower.as_bytes().get(at + prefix.len()).copied();
        if matches!(after, Some(b' ' | b'>' | b'/' | b'\t' | b'\n' | b'\r') | None) {
            return Some(at);
        }
        pos = at + prefix.len();
    }
    None
}

/// Visible text: tags removed, entities decoded, whitespace collapsed.
pub(crate) fn text(fragment: &str) -> String {
    let stripped = ANY_TAG.replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let named = s
        .replace("&nbsp;", " ")
        .replace("&pound;", "£")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");
    let numeric = NUMERIC_ENTITY.replace_all(&named, |cap: &regex::Captures<'_>| {
        let code = &cap[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric.replace("&amp;", "&")
}

/// `name -> value` for every `<input type="hidden">` in `fragment`.
pub(crate) fn hidden_inputs(fragment: &str) -> FxHashMap<String, String> {
    tags(fragment, "input")
        .into_iter()
        .filter(|t| t.attr("type").is_some_and(|ty| ty.eq_ignore_ascii_case("hidden")))
        .filter_map(|t| {
            let name = t.attr("name")?.to_string();
            let value = t.attr("value").unwrap_or_default().to_string();
            Some((name, value))
        })
        .collect()
}

/// Bodies of the direct-level `child` elements in `fragment` (e.g. every
/// `tr` of a table, every `td` of a row).
pub(crate) fn children<'h>(fragment: &'h str, child: &str) -> Vec<&'h str> {
    let mut out = Vec::new();
    let mut pos = 0;
    for tag in tags(fragment, child) {
        if tag.start < pos {
            continue;
        }
        let body = inner(fragment, &tag);
        pos = tag.end + body.len();
        out.push(body);
    }
    out
}

/// The body of the first `section` (`thead`/`tbody`) inside a table, or
/// the whole table when the section is absent.
pub(crate) fn section<'h>(table: &'h str, section: &str) -> &'h str {
    match find(table, section, |_| true) {
        Some(tag) => inner(table, &tag),
        None => table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_with_both_quote_styles() {
        let tags = all_tags(r#"<input type="hidden" name='hl_vt' value="12&amp;3" disabled>"#);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].attr("name"), Some("hl_vt"));
        assert_eq!(tags[0].attr("value"), Some("12&3"));
        assert_eq!(tags[0].attr("disabled"), Some(""));
    }

    #[test]
    fn inner_handles_nesting() {
        let html = r#"<div id="a"><div>x</div><p>y</p></div><div>z</div>"#;
        let tag = find(html, "div", |t| t.id_is("a")).unwrap();
        assert_eq!(inner(html, &tag), "<div>x</div><p>y</p>");
    }

    #[test]
    fn tag_prefix_is_not_a_match() {
        let html = "<table><tbody><tr><td>1</td></tr></tbody></table>";
        let table = find(html, "table", |_| true).unwrap();
        let rows = children(section(inner(html, &table), "tbody"), "tr");
        assert_eq!(rows, ["<td>1</td>"]);
    }

    #[test]
    fn text_collapses_and_decodes() {
        assert_eq!(text("<span>Total&nbsp;value:</span>\n  <b>&pound;1,000</b>"), "Total value: £1,000");
        assert_eq!(decode_entities("&#163;5 &amp; &#x41;"), "£5 & A");
    }

    #[test]
    fn hidden_inputs_only() {
        let map = hidden_inputs(
            r#"<input type="hidden" name="a" value="1"><input type="text" name="b" value="2"><INPUT TYPE="HIDDEN" NAME="c">"#,
        );
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert!(!map.contains_key("b"));
        assert_eq!(map.get("c").map(String::as_str), Some(""));
    }

    #[test]
    fn children_skip_nested() {
        let rows = children("<tr><td>a</td><td>b</td></tr><tr><td>c</td></tr>", "tr");
        assert_eq!(rows.len(), 2);
        assert_eq!(children(rows[0], "td"), ["a", "b"]);
    }
}
