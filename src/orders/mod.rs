//! Order positions, quotes and confirmations shared by the market and
//! manual dealing flows.
//!
//! A flow is a three-step pipeline: fetch the position page, submit (after
//! a keepalive), then confirm or read back the acknowledgement. Each step
//! hands the site back the `hl_vt` token issued by the previous page.

pub mod manual;
pub mod market;
pub mod pending;

use std::fmt;

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::sizing::{self, OrderSize};
use crate::types::{AmountKind, CategoryCode, SecurityToken, Side};

/// Which dealing path executed an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FlowKind {
    /// Immediate execution at a live quote.
    Market,
    /// Deferred fill-or-kill / limit order.
    Manual,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::Market => write!(f, "market"),
            FlowKind::Manual => write!(f, "manual"),
        }
    }
}

/// Fields only one of the two order-entry pages carries.
#[derive(Clone, Debug, PartialEq)]
pub enum PositionDetail {
    Market {
        ticker: String,
        security_name: String,
        exchange: String,
        bid_price: String,
    },
    Manual {
        security_type: String,
        out_of_hours: bool,
        transfer_units: Option<f64>,
        /// Units held net of other unsettled orders.
        remaining_units: f64,
        remaining_units_value: f64,
        bid: f64,
        ask: f64,
    },
}

/// Snapshot of the order-entry page for one security in one account.
///
/// Single use: the token is only valid for the next step of the same flow.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderPosition {
    pub token: SecurityToken,
    pub account_id: u32,
    pub sedol: String,
    pub isin: String,
    pub epic: String,
    pub currency: String,
    pub category: CategoryCode,
    pub cash_available: f64,
    pub units_held: f64,
    pub holding_value: f64,
    pub fixed_interest: bool,
    pub detail: PositionDetail,
}

impl OrderPosition {
    pub fn kind(&self) -> FlowKind {
        match self.detail {
            PositionDetail::Market { .. } => FlowKind::Market,
            PositionDetail::Manual { .. } => FlowKind::Manual,
        }
    }

    /// Units a sell percentage applies to.
    pub fn sizing_units(&self) -> f64 {
        match self.detail {
            PositionDetail::Market { .. } => self.units_held,
            PositionDetail::Manual {
                remaining_units, ..
            } => remaining_units,
        }
    }

    pub(crate) fn expect_sedol(&self, sedol: &str) -> Result<()> {
        check_sedol(sedol, &self.sedol)
    }
}

pub(crate) fn check_sedol(expected: &str, found: &str) -> Result<()> {
    if expected.eq_ignore_ascii_case(found) {
        Ok(())
    } else {
        Err(Error::SedolMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

/// A position plus what to do with it.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderTicket {
    pub position: OrderPosition,
    pub side: Side,
    pub size: OrderSize,
    /// Manual orders only; `None` leaves the limit blank.
    pub limit: Option<f64>,
    /// Manual orders only; proceed even if other orders are pending.
    pub earmark_orders_confirm: bool,
}

impl OrderTicket {
    pub fn new(position: OrderPosition, side: Side, size: OrderSize) -> Self {
        Self {
            position,
            side,
            size,
            limit: None,
            earmark_orders_confirm: false,
        }
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn earmark_orders_confirm(mut self, confirm: bool) -> Self {
        self.earmark_orders_confirm = confirm;
        self
    }
}

/// Charges and settlement details shown on the quote and confirmation pages.
/// Which lines appear depends on the market (UK or overseas).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TradeCharges {
    pub share_value: Option<f64>,
    pub commission: Option<f64>,
    pub stamp_duty: Option<f64>,
    pub ptm_levy: Option<f64>,
    pub fx_charge: Option<f64>,
    pub exchange_rate: Option<f64>,
    pub conversion_price: Option<f64>,
    pub conversion_sub_total: Option<f64>,
    pub settlement_date: Option<NaiveDate>,
    pub total_trade_value: Option<f64>,
}

/// A live market quote, valid for a short window.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderQuote {
    /// Keepalive token for the quote window.
    pub session_token: SecurityToken,
    /// Token the confirmation must post.
    pub token: SecurityToken,
    pub sedol: String,
    pub category: CategoryCode,
    pub shares: f64,
    /// Price as displayed, e.g. "18.945p".
    pub price: String,
    pub charges: TradeCharges,
}

/// An executed market deal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketConfirmation {
    pub sedol: String,
    pub shares: f64,
    pub price: String,
    pub charges: TradeCharges,
}

/// A manual order accepted onto the pending book.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManualConfirmation {
    pub order_date: NaiveDate,
    pub stock_code: String,
    pub quantity: Option<f64>,
    pub order_type: String,
    pub limit_price: Option<f64>,
    pub status: String,
    pub amount_kind: AmountKind,
}

/// Outcome of a placed order. The variant tells which flow ran.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "flow", rename_all = "lowercase")]
pub enum OrderConfirmation {
    Market(MarketConfirmation),
    Manual(ManualConfirmation),
}

impl OrderConfirmation {
    pub fn kind(&self) -> FlowKind {
        match self {
            OrderConfirmation::Market(_) => FlowKind::Market,
            OrderConfirmation::Manual(_) => FlowKind::Manual,
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self {
            OrderConfirmation::Market(c) => {
                let total = c
                    .charges
                    .total_trade_value
                    .map(|v| format!(", total £{v:.2}"))
                    .unwrap_or_default();
                format!("dealt {} x {} at {}{total}", c.shares, c.sedol, c.price)
            }
            OrderConfirmation::Manual(c) => {
                let quantity = c
                    .quantity
                    .map(|q| q.to_string())
                    .unwrap_or_else(|| "-".into());
                format!(
                    "{} order for {quantity} ({}) of {} is {}",
                    c.order_type, c.amount_kind, c.stock_code, c.status
                )
            }
        }
    }
}

/// One dealing path.
pub trait OrderFlow {
    fn kind(&self) -> FlowKind;

    fn fetch_position(
        &self,
        account_id: u32,
        sedol: &str,
        category: &CategoryCode,
    ) -> Result<OrderPosition>;

    fn place(&self, ticket: OrderTicket) -> Result<OrderConfirmation>;

    /// Fetch the position, size the order against it and place it.
    fn execute(
        &self,
        account_id: u32,
        sedol: &str,
        category: &CategoryCode,
        side: Side,
        percentage: f64,
        account_value: f64,
    ) -> Result<OrderConfirmation> {
        let position = self.fetch_position(account_id, sedol, category)?;
        let size = sizing::calculate(side, percentage, account_value, position.sizing_units())?;
        debug!(
            "{} flow sized {side} {percentage}% as {} {}",
            self.kind(),
            size.amount,
            size.kind
        );
        self.place(OrderTicket::new(position, side, size))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn market_position(sedol: &str, units: f64) -> OrderPosition {
        OrderPosition {
            token: SecurityToken::new("111"),
            account_id: 70,
            sedol: sedol.into(),
            isin: "GB0008706128".into(),
            epic: "LLOY".into(),
            currency: "GBX".into(),
            category: CategoryCode::Equity,
            cash_available: 1_000.0,
            units_held: units,
            holding_value: units * 0.5,
            fixed_interest: false,
            detail: PositionDetail::Market {
                ticker: "LLOY".into(),
                security_name: "Lloyds Banking Group plc".into(),
                exchange: "L".into(),
                bid_price: "50.12".into(),
            },
        }
    }

    pub fn manual_position(sedol: &str, units: f64, remaining: f64) -> OrderPosition {
        OrderPosition {
            detail: PositionDetail::Manual {
                security_type: "E".into(),
                out_of_hours: true,
                transfer_units: None,
                remaining_units: remaining,
                remaining_units_value: remaining * 0.5,
                bid: 50.12,
                ask: 50.2,
            },
            ..market_position(sedol, units)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn sizing_units_per_flow() {
        assert_eq!(market_position("0870612", 300.0).sizing_units(), 300.0);
        assert_eq!(manual_position("0870612", 300.0, 120.0).sizing_units(), 120.0);
        assert_eq!(manual_position("0870612", 300.0, 120.0).kind(), FlowKind::Manual);
    }

    #[test]
    fn sedol_check() {
        let p = market_position("0870612", 1.0);
        assert!(p.expect_sedol("0870612").is_ok());
        assert!(matches!(
            p.expect_sedol("B0YBKJ7"),
            Err(Error::SedolMismatch { .. })
        ));
    }

    #[test]
    fn confirmation_summary() {
        let c = OrderConfirmation::Manual(ManualConfirmation {
            order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            stock_code: "LLOY".into(),
            quantity: Some(150.0),
            order_type: "Sell".into(),
            limit_price: None,
            status: "Pending".into(),
            amount_kind: AmountKind::Quantity,
        });
        assert_eq!(c.kind(), FlowKind::Manual);
        assert_eq!(c.summary(), "Sell order for 150 (quantity) of LLOY is Pending");
    }
}
