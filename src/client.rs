//! [`HlClient`]: one authenticated session plus every client built on it.

use std::path::Path;

use log::{debug, info};

use crate::account::AccountClient;
use crate::credentials::Credentials;
use crate::deal::{DealRequest, DealResult, SmartDeal};
use crate::error::Result;
use crate::orders::manual::ManualOrderFlow;
use crate::orders::market::MarketOrderFlow;
use crate::orders::pending::PendingOrderManager;
use crate::pacing::{HumanPacer, NoPacer, Pacer};
use crate::pages::PageParser;
use crate::pages::html::HlPageParser;
use crate::search::SearchClient;
use crate::session::{AuthenticatedSession, SessionContext};
use crate::web::WebSession;
use crate::web::cookies::{self, CookieStore};
use crate::web::recorder::RequestRecorder;
use crate::web::transport::{HttpSession, TransportConfig};

/// Entry point for talking to the site.
///
/// Owns the session exclusively. The page-level clients it hands out
/// borrow it, so a deal in flight cannot share the session with another.
///
/// ```ignore
/// use hargreaves::{Credentials, DealRequest, HlClient, Side, TransportConfig};
///
/// let credentials = Credentials::new("user", "password", "010170", "123456");
/// let client = HlClient::connect(credentials, TransportConfig::default(), true)?;
/// let deal = DealRequest::new("LLOY", 70, Side::Buy, 5.0)?;
/// let result = client.smart_deal(&deal)?;
/// println!("{}", result.confirmation.summary());
/// ```
pub struct HlClient<S: WebSession = HttpSession> {
    session: AuthenticatedSession<S>,
}

impl HlClient<HttpSession> {
    /// A live session. With `pacing` off, requests go out back to back.
    pub fn connect(
        credentials: Credentials,
        config: TransportConfig,
        pacing: bool,
    ) -> Result<Self> {
        let transport = HttpSession::new(config)?;
        let pacer: Box<dyn Pacer> = if pacing {
            Box::new(HumanPacer)
        } else {
            Box::new(NoPacer::new())
        };
        Ok(Self::with_session(
            transport,
            credentials,
            Box::new(HlPageParser::new()),
            pacer,
        ))
    }

    /// Every exchange sent so far.
    pub fn recorder(&self) -> &RequestRecorder {
        self.session.inner().recorder()
    }

    /// Write the recorded traffic as HAR, with credentials masked.
    pub fn save_har(&self, path: &Path) -> Result<()> {
        let sensitive = self.session.credentials().sensitive_values();
        self.recorder().save_har(path, &sensitive)
    }
}

impl<S: WebSession> HlClient<S> {
    pub fn with_session(
        session: S,
        credentials: Credentials,
        parser: Box<dyn PageParser>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self {
            session: AuthenticatedSession::new(session, credentials, parser, pacer),
        }
    }

    pub fn session(&self) -> &AuthenticatedSession<S> {
        &self.session
    }

    fn ctx(&self) -> SessionContext<'_> {
        self.session.context()
    }

    /// Log in up front rather than on the first redirect.
    pub fn login(&self) -> Result<()> {
        self.session.login()?;
        info!("Logged in");
        Ok(())
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Restore cookies saved by an earlier run. Returns how many were loaded.
    pub fn load_cookies(&self, store: &dyn CookieStore) -> Result<usize> {
        let saved = store.load()?;
        let count = saved.len();
        for cookie in saved {
            self.session.add_cookie(cookie);
        }
        debug!(
            "Restored {count} cookies (logged in: {})",
            cookies::is_logged_in(&self.session.cookies())
        );
        Ok(count)
    }

    pub fn save_cookies(&self, store: &dyn CookieStore) -> Result<()> {
        store.save(&self.session.cookies())
    }

    pub fn accounts(&self) -> AccountClient<'_> {
        AccountClient::new(self.ctx())
    }

    pub fn search(&self) -> SearchClient<'_> {
        SearchClient::new(self.ctx())
    }

    pub fn market_orders(&self) -> MarketOrderFlow<'_> {
        MarketOrderFlow::new(self.ctx())
    }

    pub fn manual_orders(&self) -> ManualOrderFlow<'_> {
        ManualOrderFlow::new(self.ctx())
    }

    pub fn pending_orders(&self) -> PendingOrderManager<'_> {
        PendingOrderManager::new(self.ctx())
    }

    /// Search, size and deal, falling back from market to manual.
    pub fn smart_deal(&self, request: &DealRequest) -> Result<DealResult> {
        let search = self.search();
        let accounts = self.accounts();
        let market = self.market_orders();
        let manual = self.manual_orders();
        SmartDeal::new(&search, &accounts, &market, &manual).execute(request)
    }
}
