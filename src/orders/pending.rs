//! Pending (manual) orders: listing and cancellation.

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::session::SessionContext;
use crate::web::{WebRequest, site_url};

/// Phrase the site shows once a cancellation has gone through.
pub const CANCEL_SUCCESS_PHRASE: &str = "Your cancellation request has been successfully executed.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PendingOrder {
    pub account_id: u32,
    pub order_id: u64,
    pub order_date: NaiveDate,
    pub trade_type: String,
    pub sedol: String,
    pub title: String,
    pub quantity: f64,
    /// The quantity field exactly as the page sent it, echoed on cancel.
    #[serde(skip)]
    pub quantity_field: String,
    /// Quantity is a cash amount rather than units.
    pub qty_is_money: bool,
    pub limit_price: Option<f64>,
    pub status: String,
}

/// The cancellation form. The site rebuilds its view of the pending book
/// from the echoed hidden fields, so every order is included, not just the
/// one being cancelled.
pub fn cancel_form(order_id: u64, pending: &[PendingOrder]) -> Vec<(String, String)> {
    let mut form = vec![
        ("action".to_string(), "cancel".to_string()),
        ("bref".to_string(), order_id.to_string()),
    ];
    for order in pending {
        let id = order.order_id;
        form.push((format!("{id}_trade_type[]"), order.trade_type.clone()));
        form.push((format!("{id}_sedol[]"), order.sedol.clone()));
        form.push((format!("{id}_stoktitle[]"), order.title.clone()));
        form.push((format!("{id}_quantity[]"), order.quantity_field.clone()));
        form.push((
            format!("{id}_qty_is_money[]"),
            if order.qty_is_money { "1" } else { "0" }.to_string(),
        ));
    }
    form.push(("cancel".to_string(), "cancel".to_string()));
    form
}

pub struct PendingOrderManager<'a> {
    ctx: SessionContext<'a>,
}

impl<'a> PendingOrderManager<'a> {
    pub fn new(ctx: SessionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Orders waiting to be filled in `account_id`.
    pub fn list(&self, account_id: u32) -> Result<Vec<PendingOrder>> {
        debug!("Listing pending orders for account {account_id}");
        self.ctx.pacer.pause_briefly();
        let request = WebRequest::get(site_url(&format!(
            "/my-accounts/pending_orders/account/{account_id}"
        )))
        .referer(site_url(&format!(
            "/my-accounts/account_summary/account/{account_id}"
        )));
        let res = self.ctx.session.send(&request)?;
        if !res.is_ok() {
            return Err(Error::Http {
                status: res.status,
                url: res.url,
            });
        }
        self.ctx.parser.pending_orders(&res.body, account_id)
    }

    /// Cancel `order_id`. `pending` must be the account's full current
    /// pending list, as returned by [`list`](Self::list).
    pub fn cancel(&self, order_id: u64, pending: &[PendingOrder]) -> Result<bool> {
        let target = pending
            .iter()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| Error::CancelPendingOrder {
                message: format!("order {order_id} is not in the pending list"),
                body: String::new(),
            })?;

        self.ctx.pacer.pause_briefly();
        let request = WebRequest::post(site_url("/my-accounts/pending_orders"))
            .params(cancel_form(order_id, pending))
            .referer(site_url(&format!(
                "/my-accounts/pending_orders/account/{}",
                target.account_id
            )));
        let res = self.ctx.session.send(&request)?;

        if !res.is_ok() {
            return Err(Error::CancelPendingOrder {
                message: format!("cancel returned HTTP {}", res.status),
                body: res.body,
            });
        }
        if !res.contains(CANCEL_SUCCESS_PHRASE) {
            return Err(Error::CancelPendingOrder {
                message: format!("no cancellation confirmation for order {order_id}"),
                body: res.body,
            });
        }
        info!("Cancelled pending order {order_id} ({})", target.sedol);
        Ok(true)
    }
}
