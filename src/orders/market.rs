//! Market orders: position, live quote, confirmation.

use log::{debug, info};

use super::{
    FlowKind, MarketConfirmation, OrderConfirmation, OrderFlow, OrderPosition, OrderQuote,
    OrderTicket, PositionDetail, check_sedol,
};
use crate::error::{Error, Result};
use crate::keepalive::keepalive;
use crate::session::SessionContext;
use crate::types::{AmountKind, CategoryCode, Side, form_number};
use crate::web::{WebRequest, security_deal_referer, site_url};

/// Shown when the quote request carries a token from another account's page.
const WRONG_SEQUENCE_PHRASE: &str = "another account open";

/// The order-entry form fields, in the order the site's page posts them.
pub fn market_form(ticket: &OrderTicket) -> Result<Vec<(String, String)>> {
    let p = &ticket.position;
    let PositionDetail::Market {
        ticker,
        security_name,
        exchange,
        bid_price,
    } = &p.detail
    else {
        return Err(Error::InvalidRequest(format!(
            "{} position cannot be dealt at market",
            p.kind()
        )));
    };

    let mut form: Vec<(String, String)> = vec![
        ("hl_vt".into(), p.token.as_str().into()),
        ("sedol".into(), p.sedol.clone()),
        ("security_name".into(), security_name.clone()),
        ("product_no".into(), p.account_id.to_string()),
        ("available".into(), form_number(p.cash_available)),
        ("bid".into(), bid_price.clone()),
        ("holding".into(), form_number(p.units_held)),
        ("holding_value".into(), form_number(p.holding_value)),
        ("isin".into(), p.isin.clone()),
        ("epic".into(), p.epic.clone()),
        ("currency_code".into(), p.currency.clone()),
        ("exchange".into(), exchange.clone()),
        (
            "fixed_interest".into(),
            if p.fixed_interest { "1" } else { "0" }.into(),
        ),
        ("ticker".into(), ticker.clone()),
        ("remaining_holding".into(), form_number(p.units_held)),
        (
            "remaining_holding_value".into(),
            ((p.holding_value * 100.0).round() as i64).to_string(),
        ),
        ("bs".into(), ticket.side.form_value().into()),
        ("quantity".into(), ticket.size.form_amount()),
        ("qs".into(), ticket.size.kind.form_value().into()),
    ];
    // Value orders spend the amount including charges on buys only.
    if ticket.size.kind == AmountKind::Value {
        let including = if ticket.side == Side::Buy { "1" } else { "0" };
        form.push(("inc_chrgs".into(), including.into()));
    }
    Ok(form)
}

fn quote_url(category: &CategoryCode) -> String {
    if category.is_overseas() {
        site_url("/my-accounts/confirm_equity_overseas")
    } else {
        site_url("/my-accounts/confirm_equity_deal")
    }
}

fn confirmation_url(category: &CategoryCode) -> String {
    if category.is_overseas() {
        site_url("/my-accounts/equity_confirmation_overseas")
    } else {
        site_url("/my-accounts/equity_confirmation")
    }
}

/// Immediate execution at a live quote.
pub struct MarketOrderFlow<'a> {
    ctx: SessionContext<'a>,
}

impl<'a> MarketOrderFlow<'a> {
    pub fn new(ctx: SessionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Ask for a live quote on `ticket`. Keeps the position token alive first.
    pub fn quote(&self, ticket: &OrderTicket) -> Result<OrderQuote> {
        let position = &ticket.position;
        debug!("Requesting market quote for {}", position.sedol);
        let form = market_form(ticket)?;

        self.ctx.pacer.pause_briefly();
        keepalive(self.ctx, &position.sedol, &position.token)?;
        self.ctx.pacer.pause_briefly();

        let request = WebRequest::post(quote_url(&position.category))
            .xhr()
            .params(form)
            .referer(security_deal_referer(&position.sedol));
        let res = self.ctx.session.send(&request)?;

        if !res.is_ok() {
            return Err(Error::Http {
                status: res.status,
                url: res.url,
            });
        }
        if res.contains(WRONG_SEQUENCE_PHRASE) {
            return Err(Error::WrongSequence);
        }

        let quote = self.ctx.parser.market_quote(&res.body, &position.category)?;
        check_sedol(&position.sedol, &quote.sedol)?;
        debug!(
            "Quoted {} x {} at {} (session token {})",
            quote.shares, quote.sedol, quote.price, quote.session_token
        );
        Ok(quote)
    }

    /// Accept `quote`. Keeps the quote's session token alive first.
    pub fn confirm(&self, quote: &OrderQuote) -> Result<MarketConfirmation> {
        debug!("Confirming market order for {}", quote.sedol);

        self.ctx.pacer.pause_briefly();
        keepalive(self.ctx, &quote.sedol, &quote.session_token)?;
        self.ctx.pacer.pause(2, 4);

        let request = WebRequest::post(confirmation_url(&quote.category))
            .xhr()
            .param("hl_vt", quote.token.as_str())
            .param("sedol", quote.sedol.as_str())
            .referer(security_deal_referer(&quote.sedol));
        let res = self.ctx.session.send(&request)?;

        if !res.is_ok() {
            return Err(Error::order_failed(
                format!("confirmation returned HTTP {}", res.status),
                &res.body,
            ));
        }

        let confirmation = self.ctx.parser.market_confirmation(&res.body)?;
        check_sedol(&quote.sedol, &confirmation.sedol)?;
        info!(
            "Market deal done: {} x {} at {}",
            confirmation.shares, confirmation.sedol, confirmation.price
        );
        Ok(confirmation)
    }
}

impl OrderFlow for MarketOrderFlow<'_> {
    fn kind(&self) -> FlowKind {
        FlowKind::Market
    }

    fn fetch_position(
        &self,
        account_id: u32,
        sedol: &str,
        category: &CategoryCode,
    ) -> Result<OrderPosition> {
        debug!("Fetching market position for {sedol} in account {account_id}");
        self.ctx.pacer.pause_briefly();
        let request = WebRequest::get(site_url(&format!(
            "/my-accounts/account_select/account/{account_id}/sedol/{sedol}/rq/select/type/trade"
        )));
        let res = self.ctx.session.send(&request)?;
        if !res.is_ok() {
            return Err(Error::Http {
                status: res.status,
                url: res.url,
            });
        }
        let position = self.ctx.parser.market_entry(&res.body, category)?;
        position.expect_sedol(sedol)?;
        Ok(position)
    }

    fn place(&self, ticket: OrderTicket) -> Result<OrderConfirmation> {
        let quote = self.quote(&ticket)?;
        self.confirm(&quote).map(OrderConfirmation::Market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::fixtures::{manual_position, market_position};
    use crate::sizing::OrderSize;

    fn names(form: &[(String, String)]) -> Vec<&str> {
        form.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn value(form: &[(String, String)], name: &str) -> Option<String> {
        form.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn buy_by_value_includes_charges() {
        let ticket = OrderTicket::new(
            market_position("0870612", 300.0),
            Side::Buy,
            OrderSize {
                kind: AmountKind::Value,
                amount: 1_234.5,
            },
        );
        let form = market_form(&ticket).unwrap();

        assert_eq!(
            names(&form),
            [
                "hl_vt",
                "sedol",
                "security_name",
                "product_no",
                "available",
                "bid",
                "holding",
                "holding_value",
                "isin",
                "epic",
                "currency_code",
                "exchange",
                "fixed_interest",
                "ticker",
                "remaining_holding",
                "remaining_holding_value",
                "bs",
                "quantity",
                "qs",
                "inc_chrgs",
            ]
        );
        assert_eq!(value(&form, "bs").as_deref(), Some("Buy"));
        assert_eq!(value(&form, "quantity").as_deref(), Some("1234.5"));
        assert_eq!(value(&form, "qs").as_deref(), Some("value"));
        assert_eq!(value(&form, "inc_chrgs").as_deref(), Some("1"));
        assert_eq!(value(&form, "remaining_holding_value").as_deref(), Some("15000"));
        assert_eq!(value(&form, "fixed_interest").as_deref(), Some("0"));
    }

    #[test]
    fn sell_by_quantity_has_no_charges_flag() {
        let ticket = OrderTicket::new(
            market_position("0870612", 300.0),
            Side::Sell,
            OrderSize {
                kind: AmountKind::Quantity,
                amount: 150.0,
            },
        );
        let form = market_form(&ticket).unwrap();
        assert_eq!(value(&form, "quantity").as_deref(), Some("150"));
        assert_eq!(value(&form, "qs").as_deref(), Some("quantity"));
        assert_eq!(value(&form, "inc_chrgs"), None);
    }

    #[test]
    fn manual_position_is_rejected() {
        let ticket = OrderTicket::new(
            manual_position("0870612", 300.0, 300.0),
            Side::Sell,
            OrderSize {
                kind: AmountKind::Quantity,
                amount: 1.0,
            },
        );
        assert!(matches!(market_form(&ticket), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn endpoints_follow_category() {
        assert!(quote_url(&CategoryCode::Equity).ends_with("/confirm_equity_deal"));
        assert!(quote_url(&CategoryCode::Overseas).ends_with("/confirm_equity_overseas"));
        assert!(confirmation_url(&CategoryCode::Trust).ends_with("/equity_confirmation"));
        assert!(confirmation_url(&CategoryCode::Overseas).ends_with("/equity_confirmation_overseas"));
    }
}
