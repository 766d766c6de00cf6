//! # hargreaves
//!
//! Drives a Hargreaves Lansdown online account the way a browser does:
//! the same pages, forms, cookies and pacing, since the site has no API.
//!
//! ## Features
//!
//! - **Login**: the two-step username/date-of-birth then password/secure-number
//!   journey, as an explicit state machine
//! - **Self-healing session**: a request bounced to the login page logs in
//!   and is re-sent once
//! - **Market orders**: position, live quote and confirmation, with a
//!   keepalive before each dealing step
//! - **Manual orders**: fill-or-kill and limit orders onto the pending book
//! - **Smart deal**: market first, manual when the market is closed or no
//!   live quote is available
//! - **Pending orders**: list and cancel
//! - **Accounts and search**: balances, holdings and security lookup
//!
//! ## Quick Start
//!
//! ```ignore
//! use hargreaves::{Credentials, DealRequest, HlClient, Side, TransportConfig};
//!
//! let credentials = Credentials::new("user", "password", "010170", "123456");
//! let client = HlClient::connect(credentials, TransportConfig::default(), true)?;
//!
//! for account in client.accounts().list()? {
//!     println!("{} {}", account.account_id, account.account_type);
//! }
//!
//! // Sell half of the LLOY holding in account 70
//! let deal = DealRequest::new("LLOY", 70, Side::Sell, 50.0)?;
//! let result = client.smart_deal(&deal)?;
//! println!("{} flow: {}", result.flow(), result.confirmation.summary());
//! ```
//!
//! ## Position Sizing
//!
//! Buys are sized as a cash value, sells as whole units:
//!
//! ```
//! use hargreaves::{AmountKind, Side, sizing};
//!
//! let buy = sizing::calculate(Side::Buy, 10.0, 12_345.67, 0.0).unwrap();
//! assert_eq!(buy.kind, AmountKind::Value);
//! assert_eq!(buy.amount, 1_234.57);
//!
//! let sell = sizing::calculate(Side::Sell, 50.0, 0.0, 300.0).unwrap();
//! assert_eq!(sell.kind, AmountKind::Quantity);
//! assert_eq!(sell.amount, 150.0);
//! ```
//!
//! ## Testing Without the Site
//!
//! [`web::mock::MockSession`] replays canned pages and [`pacing::NoPacer`]
//! skips every delay:
//!
//! ```
//! use hargreaves::pacing::NoPacer;
//! use hargreaves::pages::html::HlPageParser;
//! use hargreaves::web::mock::MockSession;
//! use hargreaves::{Credentials, HlClient};
//!
//! let session = MockSession::new().ok("<p>You have no pending orders</p>");
//! let client = HlClient::with_session(
//!     session,
//!     Credentials::new("user", "pw", "010170", "123456"),
//!     Box::new(HlPageParser::new()),
//!     Box::new(NoPacer::at(0)),
//! );
//! assert!(client.pending_orders().list(70).unwrap().is_empty());
//! ```

pub mod account;
pub mod auth;
mod client;
mod credentials;
pub mod deal;
mod error;
pub mod keepalive;
pub mod orders;
pub mod pacing;
pub mod pages;
pub mod search;
pub mod session;
pub mod sizing;
mod types;
pub mod web;

// Re-export public API
pub use account::{AccountDetail, AccountSummary, AccountType, Holding};
pub use auth::{Login, LoginState};
pub use client::HlClient;
pub use credentials::Credentials;
pub use deal::{DealRequest, DealResult, SmartDeal};
pub use error::{AuthError, Error, LoginStep, Result};
pub use orders::pending::PendingOrder;
pub use orders::{
    FlowKind, ManualConfirmation, MarketConfirmation, OrderConfirmation, OrderFlow,
    OrderPosition, OrderQuote, OrderTicket, TradeCharges,
};
pub use search::{InvestmentType, SearchResult};
pub use session::{AuthenticatedSession, SessionContext};
pub use sizing::OrderSize;
pub use types::{AmountKind, CategoryCode, SecurityToken, Side};
pub use web::cookies::{CookieStore, FileCookieStore};
pub use web::transport::{HttpSession, TransportConfig};
pub use web::{WebRequest, WebResponse, WebSession};
