//! Smart deal: resolve the security, size against the account and try a
//! market order, falling back to a manual order when the market route is
//! unavailable.

use log::{debug, info, warn};
use serde::Serialize;

use crate::account::AccountSource;
use crate::error::{Error, Result};
use crate::orders::{FlowKind, OrderConfirmation, OrderFlow};
use crate::search::{InvestmentType, SearchResult, SecuritySearch, select_one};
use crate::types::Side;

/// What to deal. `percentage` is of the account value for buys and of the
/// units held for sells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DealRequest {
    pub ticker: String,
    /// Disambiguates a ticker the search resolves more than once.
    pub sedol: Option<String>,
    pub account_id: u32,
    pub side: Side,
    pub percentage: f64,
    /// Allow a manual fill-or-kill order when the market is closed.
    pub allow_fill_or_kill: bool,
}

impl DealRequest {
    pub fn new(
        ticker: impl Into<String>,
        account_id: u32,
        side: Side,
        percentage: f64,
    ) -> Result<Self> {
        let ticker = ticker.into();
        if ticker.trim().is_empty() {
            return Err(Error::InvalidRequest("ticker must not be empty".into()));
        }
        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(Error::InvalidRequest(format!(
                "percentage must be within [0, 100], got {percentage}"
            )));
        }
        Ok(Self {
            ticker,
            sedol: None,
            account_id,
            side,
            percentage,
            allow_fill_or_kill: true,
        })
    }

    pub fn with_sedol(mut self, sedol: impl Into<String>) -> Self {
        self.sedol = Some(sedol.into());
        self
    }

    pub fn allow_fill_or_kill(mut self, allow: bool) -> Self {
        self.allow_fill_or_kill = allow;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DealResult {
    pub request: DealRequest,
    pub security: SearchResult,
    /// Account value the order was sized against.
    pub account_value: f64,
    /// The variant says which flow actually executed.
    pub confirmation: OrderConfirmation,
}

impl DealResult {
    pub fn flow(&self) -> FlowKind {
        self.confirmation.kind()
    }
}

/// Orchestrates one deal across the market and manual flows.
pub struct SmartDeal<'a> {
    search: &'a dyn SecuritySearch,
    accounts: &'a dyn AccountSource,
    market: &'a dyn OrderFlow,
    manual: &'a dyn OrderFlow,
}

impl<'a> SmartDeal<'a> {
    pub fn new(
        search: &'a dyn SecuritySearch,
        accounts: &'a dyn AccountSource,
        market: &'a dyn OrderFlow,
        manual: &'a dyn OrderFlow,
    ) -> Self {
        Self {
            search,
            accounts,
            market,
            manual,
        }
    }

    pub fn execute(&self, request: &DealRequest) -> Result<DealResult> {
        let results = self.search.search(&request.ticker, &InvestmentType::ALL)?;
        debug!(
            "Search for '{}' returned {} results",
            request.ticker,
            results.len()
        );
        let security = select_one(results, &request.ticker, request.sedol.as_deref())?;
        if !security.internet_allowed {
            warn!("{} ({}) is flagged as not dealable online", security.ticker, security.sedol);
        }

        let account = self.accounts.account_detail(request.account_id)?;
        debug!(
            "Account {} value £{:.2}, cash £{:.2}",
            account.account_id, account.total_value, account.total_cash
        );

        let run = |flow: &dyn OrderFlow| {
            flow.execute(
                request.account_id,
                &security.sedol,
                &security.category,
                request.side,
                request.percentage,
                account.total_value,
            )
        };

        let confirmation = match run(self.market) {
            Ok(confirmation) => confirmation,
            Err(Error::MarketClosed {
                can_fill_or_kill, ..
            }) if request.allow_fill_or_kill && can_fill_or_kill => {
                warn!("Market is closed, placing a fill-or-kill order instead");
                run(self.manual)?
            }
            Err(Error::MarketOrderLiveQuote { message, .. }) => {
                warn!("No live quote ({message}), placing a manual order instead");
                run(self.manual)?
            }
            Err(e) => return Err(e),
        };

        info!(
            "Deal for {} in account {} done via {} flow: {}",
            security.ticker,
            request.account_id,
            confirmation.kind(),
            confirmation.summary()
        );
        Ok(DealResult {
            request: request.clone(),
            security,
            account_value: account.total_value,
            confirmation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use chrono::NaiveDate;

    use super::*;
    use crate::account::{AccountDetail, AccountType};
    use crate::orders::fixtures::{manual_position, market_position};
    use crate::orders::{ManualConfirmation, MarketConfirmation, OrderPosition, OrderTicket, TradeCharges};
    use crate::types::{AmountKind, CategoryCode};

    struct Search(Vec<SearchResult>);

    impl SecuritySearch for Search {
        fn search(&self, _query: &str, types: &[InvestmentType]) -> Result<Vec<SearchResult>> {
            assert_eq!(types, &InvestmentType::ALL[..]);
            Ok(self.0.clone())
        }
    }

    struct Accounts;

    impl AccountSource for Accounts {
        fn account_detail(&self, account_id: u32) -> Result<AccountDetail> {
            Ok(AccountDetail {
                account_id,
                account_type: AccountType::Sipp,
                stock_value: 9_000.0,
                total_cash: 1_000.0,
                amount_available: 1_000.0,
                total_value: 10_000.0,
                holdings: Vec::new(),
            })
        }
    }

    /// How the stub market flow answers.
    #[derive(Clone, Copy)]
    enum Market {
        Fills,
        Closed { can_fill_or_kill: bool },
        NoLiveQuote,
    }

    struct StubFlow {
        kind: FlowKind,
        market: Market,
        tickets: RefCell<Vec<OrderTicket>>,
        fetched: Cell<usize>,
    }

    impl StubFlow {
        fn new(kind: FlowKind, market: Market) -> Self {
            Self {
                kind,
                market,
                tickets: RefCell::new(Vec::new()),
                fetched: Cell::new(0),
            }
        }
    }

    impl OrderFlow for StubFlow {
        fn kind(&self) -> FlowKind {
            self.kind
        }

        fn fetch_position(&self, _: u32, sedol: &str, _: &CategoryCode) -> Result<OrderPosition> {
            self.fetched.set(self.fetched.get() + 1);
            match (self.kind, self.market) {
                (FlowKind::Market, Market::Closed { can_fill_or_kill }) => Err(Error::MarketClosed {
                    can_fill_or_kill,
                    can_limit: true,
                }),
                (FlowKind::Market, _) => Ok(market_position(sedol, 300.0)),
                (FlowKind::Manual, _) => Ok(manual_position(sedol, 300.0, 120.0)),
            }
        }

        fn place(&self, ticket: OrderTicket) -> Result<OrderConfirmation> {
            let sedol = ticket.position.sedol.clone();
            let size = ticket.size;
            self.tickets.borrow_mut().push(ticket);
            match (self.kind, self.market) {
                (FlowKind::Market, Market::NoLiveQuote) => Err(Error::MarketOrderLiveQuote {
                    message: "Unable to retrieve a live quote".into(),
                    body: String::new(),
                }),
                (FlowKind::Market, _) => Ok(OrderConfirmation::Market(MarketConfirmation {
                    sedol,
                    shares: size.amount,
                    price: "50p".into(),
                    charges: TradeCharges::default(),
                })),
                (FlowKind::Manual, _) => Ok(OrderConfirmation::Manual(ManualConfirmation {
                    order_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                    stock_code: "LLOY".into(),
                    quantity: Some(size.amount),
                    order_type: "Sell".into(),
                    limit_price: None,
                    status: "Pending".into(),
                    amount_kind: size.kind,
                })),
            }
        }
    }

    fn lloyds() -> Search {
        Search(vec![SearchResult {
            ticker: "LLOY".into(),
            name: "Lloyds Banking Group plc".into(),
            sedol: "0870612".into(),
            internet_allowed: true,
            category: CategoryCode::Equity,
        }])
    }

    fn run(market: Market, request: DealRequest) -> (Result<DealResult>, StubFlow, StubFlow) {
        let search = lloyds();
        let market_flow = StubFlow::new(FlowKind::Market, market);
        let manual_flow = StubFlow::new(FlowKind::Manual, market);
        let result = SmartDeal::new(&search, &Accounts, &market_flow, &manual_flow).execute(&request);
        (result, market_flow, manual_flow)
    }

    fn sell_half() -> DealRequest {
        DealRequest::new("LLOY", 70, Side::Sell, 50.0).unwrap()
    }

    #[test]
    fn open_market_uses_market_flow() {
        let (result, market, manual) = run(Market::Fills, sell_half());
        let result = result.unwrap();
        assert_eq!(result.flow(), FlowKind::Market);
        assert_eq!(result.account_value, 10_000.0);
        assert_eq!(market.tickets.borrow()[0].size.amount, 150.0);
        assert_eq!(manual.fetched.get(), 0);
    }

    #[test]
    fn closed_market_falls_back_to_manual() {
        let (result, _, manual) = run(Market::Closed { can_fill_or_kill: true }, sell_half());
        assert_eq!(result.unwrap().flow(), FlowKind::Manual);
        // sized against the manual page's remaining units
        let tickets = manual.tickets.borrow();
        assert_eq!(tickets[0].size.kind, AmountKind::Quantity);
        assert_eq!(tickets[0].size.amount, 60.0);
    }

    #[test]
    fn closed_market_without_fill_or_kill_is_raised() {
        for allow in [true, false] {
            let request = sell_half().allow_fill_or_kill(allow);
            let (result, _, manual) = run(Market::Closed { can_fill_or_kill: false }, request);
            assert!(matches!(
                result,
                Err(Error::MarketClosed {
                    can_fill_or_kill: false,
                    ..
                })
            ));
            assert_eq!(manual.fetched.get(), 0);
        }
    }

    #[test]
    fn fill_or_kill_disallowed_by_request_is_raised() {
        let request = sell_half().allow_fill_or_kill(false);
        let (result, _, manual) = run(Market::Closed { can_fill_or_kill: true }, request);
        assert!(matches!(result, Err(Error::MarketClosed { .. })));
        assert_eq!(manual.fetched.get(), 0);
    }

    #[test]
    fn no_live_quote_always_falls_back() {
        let request = DealRequest::new("LLOY", 70, Side::Buy, 10.0)
            .unwrap()
            .allow_fill_or_kill(false);
        let (result, _, manual) = run(Market::NoLiveQuote, request);
        assert_eq!(result.unwrap().flow(), FlowKind::Manual);
        let tickets = manual.tickets.borrow();
        assert_eq!(tickets[0].size.kind, AmountKind::Value);
        assert_eq!(tickets[0].size.amount, 1_000.0);
    }

    #[test]
    fn unresolved_ticker_is_fatal() {
        let request = DealRequest::new("BARC", 70, Side::Buy, 10.0).unwrap();
        let (result, market, _) = run(Market::Fills, request);
        assert!(matches!(result, Err(Error::SearchFilter { count: 0 })));
        assert_eq!(market.fetched.get(), 0);
    }

    #[test]
    fn request_validation() {
        assert!(DealRequest::new("", 70, Side::Buy, 10.0).is_err());
        assert!(DealRequest::new("LLOY", 70, Side::Buy, 101.0).is_err());
        let request = DealRequest::new("LLOY", 70, Side::Buy, 10.0)
            .unwrap()
            .with_sedol("0870612");
        assert_eq!(request.sedol.as_deref(), Some("0870612"));
        assert!(request.allow_fill_or_kill);
    }
}
