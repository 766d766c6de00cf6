//! Page parsing: one extractor per page kind.
//!
//! The dealing clients only see typed records; markup details stay behind
//! [`PageParser`]. [`html::HlPageParser`] is the default implementation.

pub mod html;
mod markup;

use crate::account::{AccountDetail, AccountSummary};
use crate::error::Result;
use crate::orders::pending::PendingOrder;
use crate::orders::{ManualConfirmation, MarketConfirmation, OrderPosition, OrderQuote};
use crate::search::SearchResult;
use crate::types::{AmountKind, CategoryCode, SecurityToken};

pub trait PageParser {
    /// `hl_vt` from login step one.
    fn login_token(&self, html: &str) -> Result<SecurityToken>;

    /// The three 1-based secure-number positions the site is asking for.
    fn secure_number_positions(&self, html: &str) -> Result<[usize; 3]>;

    fn account_list(&self, html: &str) -> Result<Vec<AccountSummary>>;

    /// Holdings CSV export.
    fn account_detail(&self, csv: &str, summary: &AccountSummary) -> Result<AccountDetail>;

    /// JSONP search response.
    fn search_results(&self, jsonp: &str) -> Result<Vec<SearchResult>>;

    /// Market order-entry page. A missing entry form is
    /// [`Error::MarketClosed`](crate::Error::MarketClosed).
    fn market_entry(&self, html: &str, category: &CategoryCode) -> Result<OrderPosition>;

    fn market_quote(&self, html: &str, category: &CategoryCode) -> Result<OrderQuote>;

    fn market_confirmation(&self, html: &str) -> Result<MarketConfirmation>;

    fn manual_entry(&self, html: &str, category: &CategoryCode) -> Result<OrderPosition>;

    fn manual_confirmation(&self, html: &str, amount_kind: AmountKind) -> Result<ManualConfirmation>;

    fn pending_orders(&self, html: &str, account_id: u32) -> Result<Vec<PendingOrder>>;
}
