//! Manual (fill-or-kill / limit) orders, placed onto the pending book.

use log::{debug, info};

use super::{FlowKind, OrderConfirmation, OrderFlow, OrderPosition, OrderTicket, PositionDetail};
use crate::error::{Error, Result};
use crate::keepalive::keepalive;
use crate::session::SessionContext;
use crate::types::{CategoryCode, form_number};
use crate::web::{WebRequest, security_deal_referer, site_url};

/// The manual order form fields, in page order.
pub fn manual_form(ticket: &OrderTicket) -> Result<Vec<(String, String)>> {
    let p = &ticket.position;
    let PositionDetail::Manual {
        security_type,
        out_of_hours,
        transfer_units,
        remaining_units,
        remaining_units_value,
        bid,
        ask,
    } = &p.detail
    else {
        return Err(Error::InvalidRequest(format!(
            "{} position cannot be placed as a manual order",
            p.kind()
        )));
    };
    let flag = |on: bool| if on { "1" } else { "0" }.to_string();

    Ok(vec![
        ("hl_vt".into(), p.token.as_str().into()),
        ("type".into(), security_type.clone()),
        ("out_of_hours".into(), flag(*out_of_hours)),
        ("sedol".into(), p.sedol.clone()),
        ("product_no".into(), p.account_id.to_string()),
        ("available".into(), form_number(p.cash_available)),
        ("holding".into(), form_number(p.units_held)),
        ("holding_value".into(), form_number(p.holding_value)),
        (
            "transfer_units".into(),
            transfer_units.map(form_number).unwrap_or_default(),
        ),
        ("remaining_units".into(), form_number(*remaining_units)),
        ("remaining_units_value".into(), form_number(*remaining_units_value)),
        ("isin".into(), p.isin.clone()),
        ("epic".into(), p.epic.clone()),
        ("currency_code".into(), p.currency.clone()),
        ("SD_Bid".into(), format!("{bid:.2}")),
        ("SD_Ask".into(), format!("{ask:.2}")),
        ("fixed_interest".into(), flag(p.fixed_interest)),
        ("bs".into(), ticket.side.form_value().into()),
        ("quantity".into(), ticket.size.form_amount()),
        ("qs".into(), ticket.size.kind.form_value().into()),
        ("limit".into(), ticket.limit.map(form_number).unwrap_or_default()),
        (
            "earmark_orders_confirm".into(),
            ticket.earmark_orders_confirm.to_string(),
        ),
    ])
}

fn submit_url(category: &CategoryCode) -> String {
    if category.is_overseas() {
        site_url("/my-accounts/manual_deal_overseas")
    } else {
        site_url("/my-accounts/manual_deal")
    }
}

/// Deferred orders, used out of market hours or when no live quote is
/// available. There is no quote step; submission is the acknowledgement.
pub struct ManualOrderFlow<'a> {
    ctx: SessionContext<'a>,
}

impl<'a> ManualOrderFlow<'a> {
    pub fn new(ctx: SessionContext<'a>) -> Self {
        Self { ctx }
    }
}

impl OrderFlow for ManualOrderFlow<'_> {
    fn kind(&self) -> FlowKind {
        FlowKind::Manual
    }

    fn fetch_position(
        &self,
        account_id: u32,
        sedol: &str,
        category: &CategoryCode,
    ) -> Result<OrderPosition> {
        debug!("Fetching manual order position for {sedol} in account {account_id}");
        self.ctx.pacer.pause_briefly();
        let request = WebRequest::get(site_url(&format!(
            "/my-accounts/manual_order/sedol/{sedol}/product_no/{account_id}"
        )))
        .referer(security_deal_referer(sedol));
        let res = self.ctx.session.send(&request)?;
        if !res.is_ok() {
            return Err(Error::Http {
                status: res.status,
                url: res.url,
            });
        }
        let position = self.ctx.parser.manual_entry(&res.body, category)?;
        position.expect_sedol(sedol)?;
        Ok(position)
    }

    fn place(&self, ticket: OrderTicket) -> Result<OrderConfirmation> {
        let position = &ticket.position;
        debug!(
            "Submitting manual {} order for {} {} of {}",
            ticket.side, ticket.size.amount, ticket.size.kind, position.sedol
        );
        let form = manual_form(&ticket)?;

        self.ctx.pacer.pause_briefly();
        keepalive(self.ctx, &position.sedol, &position.token)?;
        self.ctx.pacer.pause_briefly();

        let request = WebRequest::post(submit_url(&position.category))
            .xhr()
            .params(form)
            .referer(security_deal_referer(&position.sedol));
        let res = self.ctx.session.send(&request)?;

        if !res.is_ok() {
            return Err(Error::order_failed(
                format!("manual order returned HTTP {}", res.status),
                &res.body,
            ));
        }

        let confirmation = self
            .ctx
            .parser
            .manual_confirmation(&res.body, ticket.size.kind)?;
        info!(
            "Manual order accepted: {} {} ({})",
            confirmation.order_type, confirmation.stock_code, confirmation.status
        );
        Ok(OrderConfirmation::Manual(confirmation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::fixtures::{manual_position, market_position};
    use crate::sizing::OrderSize;
    use crate::types::{AmountKind, Side};

    fn sell(position: OrderPosition, units: f64) -> OrderTicket {
        OrderTicket::new(
            position,
            Side::Sell,
            OrderSize {
                kind: AmountKind::Quantity,
                amount: units,
            },
        )
    }

    #[test]
    fn form_field_order_and_values() {
        let form = manual_form(&sell(manual_position("0870612", 300.0, 250.0), 125.0)).unwrap();
        let names: Vec<_> = form.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "hl_vt",
                "type",
                "out_of_hours",
                "sedol",
                "product_no",
                "available",
                "holding",
                "holding_value",
                "transfer_units",
                "remaining_units",
                "remaining_units_value",
                "isin",
                "epic",
                "currency_code",
                "SD_Bid",
                "SD_Ask",
                "fixed_interest",
                "bs",
                "quantity",
                "qs",
                "limit",
                "earmark_orders_confirm",
            ]
        );

        let get = |name: &str| form.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());
        assert_eq!(get("out_of_hours"), Some("1"));
        assert_eq!(get("transfer_units"), Some(""));
        assert_eq!(get("remaining_units"), Some("250"));
        assert_eq!(get("SD_Bid"), Some("50.12"));
        assert_eq!(get("SD_Ask"), Some("50.20"));
        assert_eq!(get("quantity"), Some("125"));
        assert_eq!(get("qs"), Some("quantity"));
        assert_eq!(get("limit"), Some(""));
        assert_eq!(get("earmark_orders_confirm"), Some("false"));
    }

    #[test]
    fn limit_and_earmark() {
        let ticket = sell(manual_position("0870612", 300.0, 300.0), 10.0)
            .with_limit(51.5)
            .earmark_orders_confirm(true);
        let form = manual_form(&ticket).unwrap();
        assert!(form.contains(&("limit".into(), "51.5".into())));
        assert!(form.contains(&("earmark_orders_confirm".into(), "true".into())));
    }

    #[test]
    fn market_position_is_rejected() {
        let ticket = sell(market_position("0870612", 300.0), 1.0);
        assert!(matches!(manual_form(&ticket), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn submit_endpoint_follows_category() {
        assert!(submit_url(&CategoryCode::Equity).ends_with("/manual_deal"));
        assert!(submit_url(&CategoryCode::Overseas).ends_with("/manual_deal_overseas"));
    }
}
