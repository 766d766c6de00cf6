//! Session keepalive ping issued before each dealing step.

use log::debug;

use crate::error::{Error, Result};
use crate::session::SessionContext;
use crate::types::SecurityToken;
use crate::web::{WebRequest, security_deal_referer, site_url};

/// The only body the site sends when the ping succeeds.
pub const KEEPALIVE_ACK: &str = r#"session_timeout_handler(["keptalive"])"#;

/// Extend the validity window of the token issued for `sedol`'s deal page.
///
/// Any other response is a [`Error::Session`]: the in-flight deal must be
/// abandoned, though the login itself may still be good.
pub fn keepalive(ctx: SessionContext<'_>, sedol: &str, token: &SecurityToken) -> Result<()> {
    debug!("Session keepalive for {sedol}");
    let pid = ctx.pacer.epoch_millis();
    let request = WebRequest::get(site_url("/ajaxx/user.php"))
        .xhr()
        .param("method", "session_timeout_handler")
        .param("keepalive", "1")
        .param("format", "jsonp")
        .param("jsoncallback", format!("jsonp{pid}"))
        .param("hl_vt", token.as_str())
        .param("initialise", "true")
        .referer(security_deal_referer(sedol));

    let res = ctx.session.send(&request)?;
    if res.body != KEEPALIVE_ACK {
        return Err(Error::Session(format!(
            "session could not be kept alive (HTTP {}): {}",
            res.status,
            res.body.chars().take(200).collect::<String>()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::NoPacer;
    use crate::pages::html::HlPageParser;
    use crate::web::mock::MockSession;

    #[test]
    fn sends_token_and_callback() {
        let session = MockSession::new().ok(KEEPALIVE_ACK);
        let pacer = NoPacer::at(1_700_000_000_123);
        let parser = HlPageParser::new();
        let ctx = SessionContext {
            session: &session,
            parser: &parser,
            pacer: &pacer,
        };

        keepalive(ctx, "0870612", &SecurityToken::new("4242")).unwrap();

        let sent = &session.requests()[0];
        assert_eq!(sent.url, "https://online.hl.co.uk/ajaxx/user.php");
        assert_eq!(sent.param_value("hl_vt"), Some("4242"));
        assert_eq!(sent.param_value("jsoncallback"), Some("jsonp1700000000123"));
        assert_eq!(sent.param_value("initialise"), Some("true"));
        assert!(
            sent.headers
                .iter()
                .any(|(n, v)| n == "Referer" && v.ends_with("/security_deal/sedol/0870612"))
        );
    }

    #[test]
    fn anything_but_the_ack_is_a_session_error() {
        for body in ["session_timeout_handler([\"expired\"])", "", " session_timeout_handler([\"keptalive\"])"] {
            let session = MockSession::new().ok(body);
            let pacer = NoPacer::at(0);
            let parser = HlPageParser::new();
            let ctx = SessionContext {
                session: &session,
                parser: &parser,
                pacer: &pacer,
            };
            assert!(matches!(
                keepalive(ctx, "0870612", &SecurityToken::new("1")),
                Err(Error::Session(_))
            ));
        }
    }
}
