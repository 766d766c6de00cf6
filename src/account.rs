//! Account list and account detail (holdings) retrieval.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::SessionContext;
use crate::web::{WebRequest, site_url};

/// Product wrapper an account is held in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Sipp,
    StocksAndSharesIsa,
    LifetimeIsa,
    JuniorIsa,
    FundAndShareAccount,
    Other(String),
}

impl AccountType {
    /// Map the label shown on the accounts page ("View your {label}").
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "SIPP" => AccountType::Sipp,
            "Stocks & Shares ISA" => AccountType::StocksAndSharesIsa,
            "Lifetime ISA" => AccountType::LifetimeIsa,
            "Junior ISA" => AccountType::JuniorIsa,
            "Fund & Share Account" => AccountType::FundAndShareAccount,
            other => AccountType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            AccountType::Sipp => "SIPP",
            AccountType::StocksAndSharesIsa => "Stocks & Shares ISA",
            AccountType::LifetimeIsa => "Lifetime ISA",
            AccountType::JuniorIsa => "Junior ISA",
            AccountType::FundAndShareAccount => "Fund & Share Account",
            AccountType::Other(label) => label,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: u32,
    pub account_type: AccountType,
}

/// One line of the holdings export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub code: String,
    pub name: String,
    pub units_held: f64,
    pub price_pence: f64,
    pub value: f64,
    pub cost: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    pub account_id: u32,
    pub account_type: AccountType,
    pub stock_value: f64,
    pub total_cash: f64,
    pub amount_available: f64,
    pub total_value: f64,
    pub holdings: Vec<Holding>,
}

impl AccountDetail {
    /// Holding whose code matches `code` (case-insensitive).
    pub fn holding(&self, code: &str) -> Option<&Holding> {
        self.holdings
            .iter()
            .find(|h| h.code.eq_ignore_ascii_case(code))
    }
}

/// Anything that can report an account's current value.
pub trait AccountSource {
    fn account_detail(&self, account_id: u32) -> Result<AccountDetail>;
}

pub struct AccountClient<'a> {
    ctx: SessionContext<'a>,
}

impl<'a> AccountClient<'a> {
    pub fn new(ctx: SessionContext<'a>) -> Self {
        Self { ctx }
    }

    /// All accounts on the "My accounts" page.
    pub fn list(&self) -> Result<Vec<AccountSummary>> {
        debug!("Listing accounts ...");
        self.ctx.pacer.pause_briefly();
        let res = self
            .ctx
            .session
            .send(&WebRequest::get(site_url("/my-accounts")))?;
        if !res.is_ok() {
            return Err(Error::Http {
                status: res.status,
                url: res.url,
            });
        }
        self.ctx.parser.account_list(&res.body)
    }

    /// Balances and holdings for one account.
    ///
    /// The summary page must be opened first: the CSV export is for
    /// whichever account the session last viewed.
    pub fn detail(&self, summary: &AccountSummary) -> Result<AccountDetail> {
        debug!("Fetching detail for account {}", summary.account_id);
        self.ctx.pacer.pause_briefly();
        let page = self.ctx.session.send(&WebRequest::get(site_url(&format!(
            "/my-accounts/account_summary/account/{}",
            summary.account_id
        ))))?;
        if !page.is_ok() {
            return Err(Error::Http {
                status: page.status,
                url: page.url,
            });
        }

        self.ctx.pacer.pause_briefly();
        let csv = self.ctx.session.send(&WebRequest::get(site_url(
            "/my-accounts/account_summary_csv/sort/stock/sortdir/asc",
        )))?;
        if !csv.is_ok() {
            return Err(Error::Http {
                status: csv.status,
                url: csv.url,
            });
        }
        self.ctx.parser.account_detail(&csv.body, summary)
    }
}

impl AccountSource for AccountClient<'_> {
    fn account_detail(&self, account_id: u32) -> Result<AccountDetail> {
        let summary = self
            .list()?
            .into_iter()
            .find(|a| a.account_id == account_id)
            .ok_or(Error::AccountNotFound(account_id))?;
        self.detail(&summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_labels() {
        assert_eq!(AccountType::from_label("SIPP"), AccountType::Sipp);
        assert_eq!(
            AccountType::from_label(" Stocks & Shares ISA "),
            AccountType::StocksAndSharesIsa
        );
        assert_eq!(
            AccountType::from_label("Cash ISA"),
            AccountType::Other("Cash ISA".into())
        );
        assert_eq!(AccountType::FundAndShareAccount.to_string(), "Fund & Share Account");
    }

    #[test]
    fn holding_lookup_ignores_case() {
        let detail = AccountDetail {
            account_id: 1,
            account_type: AccountType::Sipp,
            stock_value: 0.0,
            total_cash: 0.0,
            amount_available: 0.0,
            total_value: 0.0,
            holdings: vec![Holding {
                code: "LLOY".into(),
                name: "Lloyds".into(),
                units_held: 10.0,
                price_pence: 50.0,
                value: 5.0,
                cost: 4.0,
                gain_loss: 1.0,
                gain_loss_pct: 25.0,
            }],
        };
        assert!(detail.holding("lloy").is_some());
        assert!(detail.holding("BARC").is_none());
    }
}
