//! Sub-command implementations.

use std::path::Path;

use chrono::Utc;
use log::{info, warn};

use hargreaves::account::AccountSource;
use hargreaves::search::{SecuritySearch, select_one};
use hargreaves::web::recorder::{DEFAULT_EXCLUDE, har_to_markdown};
use hargreaves::{
    DealRequest, DealResult, FileCookieStore, HlClient, HttpSession, InvestmentType, WebSession,
};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};

/// Options for a deal run.
#[derive(Debug, Clone, Default)]
pub struct DealOptions {
    /// Skip the confirmation prompt.
    pub force: bool,
}

/// Open a live session, restoring saved cookies and logging in if they
/// did not carry a login.
pub fn connect(config: &Config) -> Result<HlClient<HttpSession>> {
    let credentials = config.credentials()?;
    let client = HlClient::connect(credentials, config.transport(), config.pacing.enabled)?;

    if let Some(path) = &config.session.cookies_file {
        let restored = client.load_cookies(&FileCookieStore::new(path))?;
        info!("Restored {restored} cookies from {}", path.display());
    }
    if !client.is_logged_in() {
        client.login()?;
    }
    Ok(client)
}

/// Persist cookies and the redacted traffic capture.
pub fn finish(client: &HlClient<HttpSession>, config: &Config) -> Result<()> {
    if let Some(path) = &config.session.cookies_file {
        client.save_cookies(&FileCookieStore::new(path))?;
    }
    if let Some(dir) = &config.session.har_dir {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("hl-{}.har", Utc::now().format("%Y%m%dT%H%M%S")));
        client.save_har(&path)?;
        info!("Traffic saved to {}", path.display());
    }
    Ok(())
}

pub fn show_accounts<S: WebSession>(client: &HlClient<S>) -> Result<()> {
    let accounts = client.accounts().list()?;
    if accounts.is_empty() {
        println!("No accounts.");
        return Ok(());
    }
    println!("{:>8}  Type", "Account");
    for account in &accounts {
        println!("{:>8}  {}", account.account_id, account.account_type);
    }
    Ok(())
}

pub fn show_holdings<S: WebSession>(client: &HlClient<S>, account_id: u32) -> Result<()> {
    let detail = client.accounts().account_detail(account_id)?;
    println!(
        "Account {} ({}): £{:.2} total, £{:.2} stock, £{:.2} cash, £{:.2} available",
        detail.account_id,
        detail.account_type,
        detail.total_value,
        detail.stock_value,
        detail.total_cash,
        detail.amount_available,
    );
    if detail.holdings.is_empty() {
        println!("No holdings.");
        return Ok(());
    }
    println!(
        "\n{:<8} {:<36} {:>12} {:>10} {:>12} {:>8}",
        "Code", "Name", "Units", "Price(p)", "Value(£)", "Gain%"
    );
    for h in &detail.holdings {
        println!(
            "{:<8} {:<36} {:>12} {:>10.2} {:>12.2} {:>7.2}%",
            h.code,
            truncate(&h.name, 36),
            h.units_held,
            h.price_pence,
            h.value,
            h.gain_loss_pct,
        );
    }
    Ok(())
}

pub fn show_search<S: WebSession>(client: &HlClient<S>, query: &str) -> Result<()> {
    let results = client.search().search(query, &InvestmentType::ALL)?;
    if results.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }
    for r in &results {
        let online = if r.internet_allowed { "" } else { "  (not dealable online)" };
        println!(
            "{:<8} {:<8} {:<2} {}{online}",
            r.ticker,
            r.sedol,
            r.category.code(),
            r.name
        );
    }
    Ok(())
}

/// Run a smart deal. Returns `None` when the user declined.
pub fn run_deal<S: WebSession>(
    client: &HlClient<S>,
    request: &DealRequest,
    opts: &DealOptions,
    audit: &mut AuditLog,
) -> Result<Option<DealResult>> {
    audit::log_deal_started(audit, request)?;

    if !opts.force {
        let results = client.search().search(&request.ticker, &InvestmentType::ALL)?;
        let security = select_one(results, &request.ticker, request.sedol.as_deref())?;
        println!(
            "{} {}% of account {}: {} ({}, {})",
            request.side, request.percentage, request.account_id, security.name, security.ticker,
            security.sedol
        );

        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Deal?")
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
        audit::log_user_confirmed(audit, confirmed)?;
        if !confirmed {
            println!("Aborted.");
            return Ok(None);
        }
    }

    match client.smart_deal(request) {
        Ok(result) => {
            audit::log_security_resolved(audit, &result.security)?;
            audit::log_deal_completed(audit, &result)?;
            println!("{} flow: {}", result.flow(), result.confirmation.summary());
            Ok(Some(result))
        }
        Err(e) => {
            warn!("Deal for {} failed: {e}", request.ticker);
            audit::log_deal_failed(audit, request, &e)?;
            Err(e.into())
        }
    }
}

pub fn show_pending<S: WebSession>(client: &HlClient<S>, account_id: u32) -> Result<()> {
    let orders = client.pending_orders().list(account_id)?;
    if orders.is_empty() {
        println!("No pending orders in account {account_id}.");
        return Ok(());
    }
    println!(
        "{:>10} {:<10} {:<5} {:<8} {:>12} {:>8}  Status",
        "Order", "Date", "Type", "SEDOL", "Quantity", "Limit"
    );
    for o in &orders {
        let quantity = if o.qty_is_money {
            format!("£{:.2}", o.quantity)
        } else {
            o.quantity.to_string()
        };
        let limit = o
            .limit_price
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>10} {:<10} {:<5} {:<8} {:>12} {:>8}  {}",
            o.order_id, o.order_date, o.trade_type, o.sedol, quantity, limit, o.status
        );
    }
    Ok(())
}

pub fn cancel_pending<S: WebSession>(
    client: &HlClient<S>,
    account_id: u32,
    order_id: u64,
    audit: &mut AuditLog,
) -> Result<()> {
    let manager = client.pending_orders();
    let pending = manager.list(account_id)?;
    manager.cancel(order_id, &pending)?;
    if let Some(order) = pending.iter().find(|o| o.order_id == order_id) {
        audit::log_pending_cancelled(audit, order)?;
    }
    println!("Cancelled order {order_id}.");
    Ok(())
}

/// Render a saved HAR capture as markdown.
pub fn render_report(har: &Path) -> Result<String> {
    let json = std::fs::read_to_string(har)?;
    Ok(har_to_markdown(&json, DEFAULT_EXCLUDE)?)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
