//! [`PageParser`] for the site's server-rendered HTML, CSV and JSONP.

use std::sync::LazyLock;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::PageParser;
use super::markup::{self, Tag};
use crate::account::{AccountDetail, AccountSummary, AccountType, Holding};
use crate::error::{AuthError, Error, Result};
use crate::orders::pending::PendingOrder;
use crate::orders::{
    ManualConfirmation, MarketConfirmation, OrderPosition, OrderQuote, PositionDetail,
    TradeCharges,
};
use crate::search::SearchResult;
use crate::types::{AmountKind, CategoryCode, SecurityToken};

/// Summary attribute of the pending-orders table, on both the pending list
/// and the manual order acknowledgement.
const PENDING_TABLE_SUMMARY: &str = "Your current pending orders";

const LIVE_QUOTE_UNAVAILABLE: &str = "Unable to retrieve a live quote";

static SESSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var security_token = '(\d+)';").expect("session token regex is valid")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digits regex is valid"));

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/?$").expect("trailing digits regex is valid"));

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.]+").expect("number regex is valid"));

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)$").expect("trailing number regex is valid"));

static ACCOUNT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"View your (.+)$").expect("account title regex is valid"));

static CANCEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"value='(\d*)'").expect("cancel id regex is valid"));

/// Parses the live site's pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct HlPageParser;

impl HlPageParser {
    pub fn new() -> Self {
        Self
    }
}

impl PageParser for HlPageParser {
    fn login_token(&self, html: &str) -> Result<SecurityToken> {
        markup::find(html, "input", |t| t.attr("name") == Some("hl_vt"))
            .and_then(|t| t.attr("value").map(str::to_string))
            .filter(|v| !v.is_empty())
            .map(SecurityToken::new)
            .ok_or_else(|| AuthError::TokenNotFound.into())
    }

    fn secure_number_positions(&self, html: &str) -> Result<[usize; 3]> {
        let tags = markup::all_tags(html);
        let mut positions = [0usize; 3];
        for (i, slot) in positions.iter_mut().enumerate() {
            let id = format!("secure-number-{}", i + 1);
            let position = tags
                .iter()
                .find(|t| t.id_is(&id))
                .and_then(|t| t.attr("title"))
                .and_then(|title| DIGITS.find(title))
                .and_then(|m| m.as_str().parse().ok())
                .ok_or(AuthError::SecureNumbersNotFound(id))?;
            *slot = position;
        }
        Ok(positions)
    }

    fn account_list(&self, html: &str) -> Result<Vec<AccountSummary>> {
        const PAGE: &str = "accounts page";
        let table = markup::find(html, "table", |t| t.has_class("accounts-table"))
            .ok_or_else(|| Error::parse(PAGE, "accounts table not present"))?;
        let body = markup::section(markup::inner(html, &table), "tbody");

        let mut accounts = Vec::new();
        for row in markup::children(body, "tr") {
            let first_cell = markup::children(row, "td")
                .into_iter()
                .next()
                .ok_or_else(|| Error::parse(PAGE, "account row without cells"))?;
            let anchor = markup::find(first_cell, "a", |_| true)
                .ok_or_else(|| Error::parse(PAGE, "account row without a link"))?;

            let href = anchor.attr("href").unwrap_or_default();
            let account_id = TRAILING_DIGITS
                .captures(href)
                .and_then(|c| c[1].parse().ok())
                .ok_or_else(|| Error::parse(PAGE, format!("no account id in '{href}'")))?;
            let title = anchor.attr("title").unwrap_or_default();
            let label = ACCOUNT_TITLE
                .captures(title)
                .map(|c| c[1].to_string())
                .ok_or_else(|| Error::parse(PAGE, format!("no account type in '{title}'")))?;

            accounts.push(AccountSummary {
                account_id,
                account_type: AccountType::from_label(&label),
            });
        }

        if accounts.is_empty() {
            return Err(Error::parse(PAGE, "list of accounts not present"));
        }
        Ok(accounts)
    }

    fn account_detail(&self, csv: &str, summary: &AccountSummary) -> Result<AccountDetail> {
        const PAGE: &str = "holdings CSV";
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(csv.as_bytes());

        let mut stock_value = None;
        let mut total_cash = None;
        let mut amount_available = None;
        let mut total_value = None;
        let mut in_holdings = false;
        let mut holdings = Vec::new();

        for record in reader.records() {
            let record = record.map_err(|e| Error::parse(PAGE, e.to_string()))?;
            if record.len() < 2 {
                continue;
            }
            let cell = |i: usize| record.get(i).unwrap_or_default();
            let amount = |i: usize| {
                csv_number(cell(i))
                    .ok_or_else(|| Error::parse(PAGE, format!("'{}' is not a number", cell(i))))
            };

            match cell(0) {
                "Stock value:" => stock_value = Some(amount(1)?),
                "Total cash:" => total_cash = Some(amount(1)?),
                "Amount available to invest:" => amount_available = Some(amount(1)?),
                "Total value:" => total_value = Some(amount(1)?),
                "Code" => in_holdings = true,
                "" if cell(1) == "Totals" => in_holdings = false,
                _ if in_holdings => {
                    if record.len() < 8 {
                        return Err(Error::parse(
                            PAGE,
                            format!("holding row has {} columns", record.len()),
                        ));
                    }
                    holdings.push(Holding {
                        code: cell(0).to_string(),
                        name: cell(1).to_string(),
                        units_held: amount(2)?,
                        price_pence: amount(3)?,
                        value: amount(4)?,
                        cost: amount(5)?,
                        gain_loss: amount(6)?,
                        gain_loss_pct: amount(7)?,
                    });
                }
                _ => {}
            }
        }

        let required = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| Error::parse(PAGE, format!("'{name}' row missing")))
        };
        Ok(AccountDetail {
            account_id: summary.account_id,
            account_type: summary.account_type.clone(),
            stock_value: required(stock_value, "Stock value:")?,
            total_cash: required(total_cash, "Total cash:")?,
            amount_available: required(amount_available, "Amount available to invest:")?,
            total_value: required(total_value, "Total value:")?,
            holdings,
        })
    }

    fn search_results(&self, jsonp: &str) -> Result<Vec<SearchResult>> {
        let json = jsonp
            .split_once('(')
            .map(|(_, rest)| rest.trim_end().trim_end_matches(';').trim_end_matches(')'))
            .ok_or_else(|| Error::parse("search response", "not a JSONP callback"))?;

        let envelope: SearchEnvelope = serde_json::from_str(json)?;
        Ok(envelope
            .response
            .docs
            .into_iter()
            .map(|doc| SearchResult {
                ticker: doc.stock_ticker.or(doc.epic).unwrap_or_default(),
                name: doc.identifier,
                sedol: doc.id,
                internet_allowed: doc.internet_allowed.as_deref() == Some("Y"),
                category: CategoryCode::from_code(&doc.category),
            })
            .collect())
    }

    fn market_entry(&self, html: &str, category: &CategoryCode) -> Result<OrderPosition> {
        const PAGE: &str = "market order entry page";
        // "Market closed" text is always in the page; the form is the signal.
        let Some(form) = markup::find(html, "form", |t| t.id_is("order_entry")) else {
            let has_link = |title: &str| {
                markup::tags(html, "a")
                    .iter()
                    .any(|t| t.attr("title") == Some(title))
            };
            return Err(Error::MarketClosed {
                can_fill_or_kill: has_link("Place fill or kill"),
                can_limit: has_link("Place limit order"),
            });
        };

        let fields = Fields::new(PAGE, markup::hidden_inputs(markup::inner(html, &form)));
        Ok(OrderPosition {
            token: SecurityToken::new(fields.text("hl_vt")?),
            account_id: fields.integer("product_no")?,
            sedol: fields.text("sedol")?,
            isin: fields.text("isin")?,
            epic: fields.text("epic")?,
            currency: fields.text("currency_code")?,
            category: category.clone(),
            cash_available: fields.number("available")?,
            units_held: fields.number("holding")?,
            holding_value: fields.number("holding_value")?,
            fixed_interest: fields.text("fixed_interest")? == "1",
            detail: PositionDetail::Market {
                ticker: fields.text("ticker")?,
                security_name: fields.text("security_name")?,
                exchange: fields.text("exchange")?,
                bid_price: fields.text("bid")?,
            },
        })
    }

    fn market_quote(&self, html: &str, category: &CategoryCode) -> Result<OrderQuote> {
        const PAGE: &str = "market order quote page";
        let Some(form) = markup::find(html, "form", |t| t.id_is("dealform")) else {
            let message = dialog_text(html).unwrap_or_else(|| "Unknown, check HTML".into());
            return Err(dealing_error(message, html));
        };
        let form_body = markup::inner(html, &form);

        let session_token = SESSION_TOKEN
            .captures(html)
            .map(|c| SecurityToken::new(&c[1]))
            .ok_or_else(|| Error::parse(PAGE, "session security token not found"))?;
        let fields = Fields::new(PAGE, markup::hidden_inputs(form_body));

        let quantity = markup::find(html, "div", |t| t.has_class("quote_quantity"))
            .map(|t| markup::inner(html, &t))
            .ok_or_else(|| Error::parse(PAGE, "quote quantity not found"))?;
        let spans = markup::tags(quantity, "span");

        // "Buy 527"
        let deal_text = spans
            .iter()
            .find(|t| t.has_class("deal_text_lg"))
            .map(|t| markup::text(markup::inner(quantity, t)))
            .ok_or_else(|| Error::parse(PAGE, "deal text not found"))?;
        let shares = TRAILING_NUMBER
            .captures(&deal_text)
            .and_then(|c| c[1].parse().ok())
            .ok_or_else(|| Error::parse(PAGE, format!("no share count in '{deal_text}'")))?;

        // "18.945p"
        let price = spans
            .get(2)
            .map(|t| markup::text(markup::inner(quantity, t)))
            .filter(|p| FIRST_NUMBER.is_match(p))
            .ok_or_else(|| Error::parse(PAGE, "invalid format for quoted price"))?;

        Ok(OrderQuote {
            session_token,
            token: SecurityToken::new(fields.text("hl_vt")?),
            sedol: fields.text("sedol")?,
            category: category.clone(),
            shares,
            price,
            charges: charges_table(form_body, PAGE)?,
        })
    }

    fn market_confirmation(&self, html: &str) -> Result<MarketConfirmation> {
        const PAGE: &str = "market order confirmation page";
        let Some(content) = markup::find(html, "div", |t| t.id_is("quote_content")) else {
            return Err(match dialog_text(html) {
                Some(message) => dealing_error(message, html),
                None => Error::order_failed("Unexpected error, see HTML for more details", html),
            });
        };
        let body = markup::inner(html, &content);

        let data = |name: &str| content.attr(&format!("data-trade-{name}")).unwrap_or_default();
        let data_number = |name: &str| {
            form_number(data(name)).ok_or_else(|| {
                Error::parse(PAGE, format!("data-trade-{name} '{}' is not a number", data(name)))
            })
        };

        let price = markup::tags(body, "span")
            .iter()
            .filter(|t| t.attr("class") == Some("label-bold deal_text_lg"))
            .nth(2)
            .map(|t| markup::text(markup::inner(body, t)))
            .filter(|p| is_display_price(p))
            .ok_or_else(|| Error::parse(PAGE, "invalid format for dealt price"))?;

        let mut charges = TradeCharges {
            share_value: Some(data_number("total-net")?),
            commission: Some(data_number("commission")?),
            total_trade_value: Some(data_number("total-gross")?),
            ..TradeCharges::default()
        };
        let table = charges_table(body, PAGE)?;
        merge_charges(&mut charges, table);

        Ok(MarketConfirmation {
            sedol: data("sedol").to_string(),
            shares: data_number("quantity")?,
            price,
            charges,
        })
    }

    fn manual_entry(&self, html: &str, category: &CategoryCode) -> Result<OrderPosition> {
        const PAGE: &str = "manual order entry page";
        let form = markup::find(html, "form", |t| t.id_is("oh_form"))
            .ok_or_else(|| Error::order_failed("Could not find 'oh_form'", html))?;
        let fields = Fields::new(PAGE, markup::hidden_inputs(markup::inner(html, &form)));

        Ok(OrderPosition {
            token: SecurityToken::new(fields.text("hl_vt")?),
            account_id: fields.integer("product_no")?,
            sedol: fields.text("sedol")?,
            isin: fields.text("isin")?,
            epic: fields.text("epic")?,
            currency: fields.text("currency_code")?,
            category: category.clone(),
            cash_available: fields.number("available")?,
            units_held: fields.number("holding")?,
            holding_value: fields.number("holding_value")?,
            fixed_interest: fields.flag("fixed_interest")?,
            detail: PositionDetail::Manual {
                security_type: fields.text("type")?,
                out_of_hours: fields.flag("out_of_hours")?,
                transfer_units: fields.optional_number("transfer_units")?,
                remaining_units: fields.number("remaining_units")?,
                remaining_units_value: fields.number("remaining_units_value")?,
                bid: fields.number("SD_Bid")?,
                ask: fields.number("SD_Ask")?,
            },
        })
    }

    fn manual_confirmation(&self, html: &str, amount_kind: AmountKind) -> Result<ManualConfirmation> {
        if let Some(error_box) = markup::find(html, "div", |t| {
            t.has_class("box") && t.has_class("error-box")
        }) {
            return Err(Error::order_failed(
                markup::text(markup::inner(html, &error_box)),
                html,
            ));
        }

        let table = pending_table(html).ok_or_else(|| {
            Error::order_failed("Pending order table not found, see HTML for more details", html)
        })?;
        let table_body = markup::inner(html, &table);

        let headers: Vec<String> = markup::children(table_body, "th")
            .into_iter()
            .map(markup::text)
            .collect();
        if headers.len() != 6 {
            return Err(Error::order_failed(
                format!("Unexpected number of header columns ({})", headers.len()),
                html,
            ));
        }
        let cells: Vec<String> = markup::children(table_body, "td")
            .into_iter()
            .map(markup::text)
            .collect();
        if cells.len() != 6 {
            return Err(Error::order_failed(
                format!("Unexpected number of cells ({})", cells.len()),
                html,
            ));
        }

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .map(|i| cells[i].as_str())
                .ok_or_else(|| Error::order_failed(format!("'{name}' column missing"), html))
        };
        let optional = |name: &str| -> Result<Option<f64>> {
            let raw = column(name)?;
            if raw.is_empty() || raw == "-" {
                return Ok(None);
            }
            form_number(raw)
                .map(Some)
                .ok_or_else(|| Error::order_failed(format!("{name} '{raw}' is not a number"), html))
        };

        let raw_date = column("Date of order")?;
        let order_date = NaiveDate::parse_from_str(raw_date, "%d/%m/%y").map_err(|e| {
            Error::order_failed(format!("order date '{raw_date}': {e}"), html)
        })?;

        Ok(ManualConfirmation {
            order_date,
            stock_code: column("Stock Code")?.to_string(),
            quantity: optional("Quantity")?,
            order_type: column("Order Type")?.to_string(),
            limit_price: optional("Limit Price")?,
            status: column("Order Status")?.to_string(),
            amount_kind,
        })
    }

    fn pending_orders(&self, html: &str, account_id: u32) -> Result<Vec<PendingOrder>> {
        const PAGE: &str = "pending orders page";
        let Some(table) = pending_table(html) else {
            return Ok(Vec::new());
        };
        let table_body = markup::inner(html, &table);

        let headers: Vec<String> = markup::children(markup::section(table_body, "thead"), "th")
            .into_iter()
            .map(markup::text)
            .collect();
        if headers.len() != 8 {
            return Err(Error::parse(
                PAGE,
                format!("unexpected number of header columns ({})", headers.len()),
            ));
        }
        let fields = Fields::new(PAGE, markup::hidden_inputs(table_body));

        let mut orders = Vec::new();
        for row in markup::children(markup::section(table_body, "tbody"), "tr") {
            let cells = markup::children(row, "td");
            if cells.len() != 8 {
                return Err(Error::parse(
                    PAGE,
                    format!("unexpected number of cells ({})", cells.len()),
                ));
            }
            let column = |name: &str| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .map(|i| cells[i])
                    .ok_or_else(|| Error::parse(PAGE, format!("'{name}' column missing")))
            };

            let order_id: u64 = markup::find(column("Cancel")?, "button", |_| true)
                .and_then(|b| b.attr("onclick").map(str::to_string))
                .and_then(|onclick| CANCEL_ID.captures(&onclick).map(|c| c[1].to_string()))
                .and_then(|id| id.parse().ok())
                .ok_or_else(|| Error::parse(PAGE, "cancel button without an order id"))?;

            let raw_date = markup::text(column("Order date")?);
            let order_date = NaiveDate::parse_from_str(&raw_date, "%d/%m/%y")
                .map_err(|e| Error::parse(PAGE, format!("order date '{raw_date}': {e}")))?;
            let raw_limit = markup::text(column("Limit price")?);
            let limit_price = match raw_limit.as_str() {
                "" | "-" => None,
                raw => Some(form_number(raw).ok_or_else(|| {
                    Error::parse(PAGE, format!("limit price '{raw}' is not a number"))
                })?),
            };

            orders.push(PendingOrder {
                account_id,
                order_id,
                order_date,
                trade_type: fields.text(&format!("{order_id}_trade_type[]"))?,
                sedol: fields.text(&format!("{order_id}_sedol[]"))?,
                title: fields.text(&format!("{order_id}_stoktitle[]"))?,
                quantity: fields.number(&format!("{order_id}_quantity[]"))?,
                quantity_field: fields.text(&format!("{order_id}_quantity[]"))?,
                qty_is_money: fields.flag(&format!("{order_id}_qty_is_money[]"))?,
                limit_price,
                status: markup::text(column("Status")?),
            });
        }
        Ok(orders)
    }
}

#[derive(Deserialize)]
struct SearchEnvelope {
    response: SearchDocs,
}

#[derive(Deserialize)]
struct SearchDocs {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Deserialize)]
struct SearchDoc {
    stock_ticker: Option<String>,
    epic: Option<String>,
    identifier: String,
    id: String,
    internet_allowed: Option<String>,
    #[serde(default)]
    category: String,
}

/// Hidden form fields with typed, error-reporting accessors.
struct Fields {
    page: &'static str,
    values: FxHashMap<String, String>,
}

impl Fields {
    fn new(page: &'static str, values: FxHashMap<String, String>) -> Self {
        Self { page, values }
    }

    fn raw(&self, name: &str) -> Result<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::parse(self.page, format!("hidden field '{name}' missing")))
    }

    fn text(&self, name: &str) -> Result<String> {
        self.raw(name).map(str::to_string)
    }

    /// Empty is zero.
    fn number(&self, name: &str) -> Result<f64> {
        let raw = self.raw(name)?;
        if raw.is_empty() {
            return Ok(0.0);
        }
        form_number(raw)
            .ok_or_else(|| Error::parse(self.page, format!("'{name}' value '{raw}' is not a number")))
    }

    fn optional_number(&self, name: &str) -> Result<Option<f64>> {
        if self.raw(name)?.is_empty() {
            return Ok(None);
        }
        self.number(name).map(Some)
    }

    fn integer(&self, name: &str) -> Result<u32> {
        let raw = self.raw(name)?;
        raw.parse()
            .map_err(|_| Error::parse(self.page, format!("'{name}' value '{raw}' is not an integer")))
    }

    fn flag(&self, name: &str) -> Result<bool> {
        Ok(matches!(self.raw(name)?, "1" | "true" | "True"))
    }
}

/// A plain number with optional thousands separators.
fn form_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse().ok()
}

/// CSV amounts may carry a currency or percent sign.
fn csv_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim_start_matches('£').trim_end_matches(['%', 'p']);
    form_number(cleaned)
}

/// "18.35p" or "£1.4762".
fn is_display_price(price: &str) -> bool {
    let pence = price
        .strip_suffix('p')
        .is_some_and(|n| form_number(n).is_some());
    let pounds = price
        .strip_prefix('£')
        .is_some_and(|n| form_number(n).is_some());
    pence || pounds
}

fn pending_table(html: &str) -> Option<Tag> {
    markup::find(html, "table", |t| t.attr("summary") == Some(PENDING_TABLE_SUMMARY))
}

/// Text of the site's modal error dialog, if shown.
fn dialog_text(html: &str) -> Option<String> {
    markup::find(html, "div", |t| t.has_class("dialog_content"))
        .map(|t| markup::text(markup::inner(html, &t)))
}

fn dealing_error(message: String, html: &str) -> Error {
    if message.contains(LIVE_QUOTE_UNAVAILABLE) {
        Error::MarketOrderLiveQuote {
            message,
            body: html.to_string(),
        }
    } else {
        Error::order_failed(message, html)
    }
}

/// Charge lines of the first table in `fragment`. Row labels differ
/// between UK and overseas deals; unknown rows are ignored.
fn charges_table(fragment: &str, page: &'static str) -> Result<TradeCharges> {
    let mut charges = TradeCharges::default();
    let Some(table) = markup::find(fragment, "table", |_| true) else {
        return Ok(charges);
    };
    let body = markup::section(markup::inner(fragment, &table), "tbody");

    for row in markup::children(body, "tr") {
        let cells = markup::children(row, "td");
        let [label_cell, value_cell, ..] = cells.as_slice() else {
            continue;
        };
        let label = match markup::find(label_cell, "span", |_| true) {
            Some(span) => markup::text(markup::inner(label_cell, &span)),
            None => markup::text(label_cell),
        };
        let value = markup::text(value_cell).replace(',', "");

        let trailing = || {
            TRAILING_NUMBER
                .captures(&value)
                .and_then(|c| c[1].parse().ok())
                .ok_or_else(|| Error::parse(page, format!("no amount for '{label}' in '{value}'")))
        };

        match label.as_str() {
            "Value:" | "Total value of trade:" => {
                let span_text = match markup::find(value_cell, "span", |_| true) {
                    Some(span) => markup::text(markup::inner(value_cell, &span)).replace(',', ""),
                    None => value.clone(),
                };
                let amount = FIRST_NUMBER
                    .find(&span_text)
                    .and_then(|m| m.as_str().parse().ok())
                    .ok_or_else(|| Error::parse(page, format!("no amount for '{label}'")))?;
                if label == "Value:" {
                    charges.share_value = Some(amount);
                } else {
                    charges.total_trade_value = Some(amount);
                }
            }
            "PTM levy:" => charges.ptm_levy = Some(trailing()?),
            "Commission:" | "Commission" => charges.commission = Some(trailing()?),
            "Stamp duty:" => charges.stamp_duty = Some(trailing()?),
            "FX charge" => charges.fx_charge = Some(trailing()?),
            "Exchange rate" => charges.exchange_rate = Some(trailing()?),
            "Price" => charges.conversion_price = Some(trailing()?),
            "Sub total" => charges.conversion_sub_total = Some(trailing()?),
            "Settlement date:" | "Settlement date" => {
                let date = NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y")
                    .map_err(|e| Error::parse(page, format!("settlement date '{value}': {e}")))?;
                charges.settlement_date = Some(date);
            }
            _ => {}
        }
    }
    Ok(charges)
}

/// Lines present in `table` win over what is already in `charges`.
fn merge_charges(charges: &mut TradeCharges, table: TradeCharges) {
    let TradeCharges {
        share_value,
        commission,
        stamp_duty,
        ptm_levy,
        fx_charge,
        exchange_rate,
        conversion_price,
        conversion_sub_total,
        settlement_date,
        total_trade_value,
    } = table;
    charges.share_value = share_value.or(charges.share_value);
    charges.commission = commission.or(charges.commission);
    charges.stamp_duty = stamp_duty.or(charges.stamp_duty);
    charges.ptm_levy = ptm_levy.or(charges.ptm_levy);
    charges.fx_charge = fx_charge.or(charges.fx_charge);
    charges.exchange_rate = exchange_rate.or(charges.exchange_rate);
    charges.conversion_price = conversion_price.or(charges.conversion_price);
    charges.conversion_sub_total = conversion_sub_total.or(charges.conversion_sub_total);
    charges.settlement_date = settlement_date.or(charges.settlement_date);
    charges.total_trade_value = total_trade_value.or(charges.total_trade_value);
}
