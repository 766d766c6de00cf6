//! Security search.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::SessionContext;
use crate::types::CategoryCode;
use crate::web::{WebRequest, site_url};

/// Investment types the search can be restricted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentType {
    Shares,
    Overseas,
    Funds,
    Etfs,
}

impl InvestmentType {
    pub const ALL: [InvestmentType; 4] = [
        InvestmentType::Overseas,
        InvestmentType::Funds,
        InvestmentType::Etfs,
        InvestmentType::Shares,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentType::Shares => "shares",
            InvestmentType::Overseas => "overseas",
            InvestmentType::Funds => "funds",
            InvestmentType::Etfs => "etfs",
        }
    }
}

impl fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub ticker: String,
    pub name: String,
    pub sedol: String,
    /// Whether the security can be dealt online.
    pub internet_allowed: bool,
    pub category: CategoryCode,
}

/// Anything that can look securities up by name or ticker.
pub trait SecuritySearch {
    fn search(&self, query: &str, types: &[InvestmentType]) -> Result<Vec<SearchResult>>;
}

/// Keep results whose ticker equals `ticker` (ignoring case) and, when given,
/// whose SEDOL equals `sedol`. Anything but exactly one match is an error.
pub fn select_one(
    results: Vec<SearchResult>,
    ticker: &str,
    sedol: Option<&str>,
) -> Result<SearchResult> {
    let mut matches: Vec<SearchResult> = results
        .into_iter()
        .filter(|r| r.ticker.eq_ignore_ascii_case(ticker))
        .filter(|r| sedol.is_none_or(|s| r.sedol.eq_ignore_ascii_case(s)))
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        count => Err(Error::SearchFilter { count }),
    }
}

pub struct SearchClient<'a> {
    ctx: SessionContext<'a>,
}

impl<'a> SearchClient<'a> {
    pub fn new(ctx: SessionContext<'a>) -> Self {
        Self { ctx }
    }
}

impl SecuritySearch for SearchClient<'_> {
    fn search(&self, query: &str, types: &[InvestmentType]) -> Result<Vec<SearchResult>> {
        debug!("Searching securities for '{query}' ...");
        self.ctx.pacer.pause_briefly();

        // The site's filter lists the types to exclude.
        let excluded: Vec<&str> = InvestmentType::ALL
            .iter()
            .filter(|t| !types.contains(t))
            .map(InvestmentType::as_str)
            .collect();

        let request = WebRequest::get(site_url("/ajaxx/stocks.php"))
            .xhr()
            .param("pid", self.ctx.pacer.epoch_millis().to_string())
            .param("sq", query)
            .param("filters", excluded.join(","))
            .param("offset", "0")
            .param("instance", "")
            .param("format", "jsonp")
            .referer(site_url("/my-accounts/stock_and_fund_search/action/deal"));

        let res = self.ctx.session.send(&request)?;
        if !res.is_ok() {
            return Err(Error::Http {
                status: res.status,
                url: res.url,
            });
        }
        self.ctx.parser.search_results(&res.body)
    }
}
