//! JSONL audit trail of dealing activity.
//!
//! Every deal and cancellation appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use hargreaves::{DealRequest, DealResult, PendingOrder, SearchResult};

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn log_deal_started(audit: &mut AuditLog, request: &DealRequest) -> Result<()> {
    audit.log(
        "deal_started",
        serde_json::json!({
            "ticker": request.ticker,
            "sedol": request.sedol,
            "account": request.account_id,
            "side": request.side.to_string(),
            "pct": request.percentage,
            "allow_fill_or_kill": request.allow_fill_or_kill,
        }),
    )
}

pub fn log_security_resolved(audit: &mut AuditLog, security: &SearchResult) -> Result<()> {
    audit.log(
        "security_resolved",
        serde_json::json!({
            "ticker": security.ticker,
            "sedol": security.sedol,
            "name": security.name,
            "category": security.category.code(),
        }),
    )
}

pub fn log_user_confirmed(audit: &mut AuditLog, approved: bool) -> Result<()> {
    audit.log("user_confirmed", serde_json::json!({ "approved": approved }))
}

/// The confirmation is recorded in full, tagged with the flow that ran.
pub fn log_deal_completed(audit: &mut AuditLog, result: &DealResult) -> Result<()> {
    let confirmation = serde_json::to_value(&result.confirmation)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    audit.log(
        "deal_completed",
        serde_json::json!({
            "sedol": result.security.sedol,
            "account": result.request.account_id,
            "flow": result.flow().to_string(),
            "account_value": result.account_value,
            "summary": result.confirmation.summary(),
            "confirmation": confirmation,
        }),
    )
}

pub fn log_deal_failed(audit: &mut AuditLog, request: &DealRequest, err: &hargreaves::Error) -> Result<()> {
    audit.log(
        "deal_failed",
        serde_json::json!({
            "ticker": request.ticker,
            "account": request.account_id,
            "error": err.to_string(),
        }),
    )
}

pub fn log_pending_cancelled(audit: &mut AuditLog, order: &PendingOrder) -> Result<()> {
    audit.log(
        "pending_cancelled",
        serde_json::json!({
            "account": order.account_id,
            "order_id": order.order_id,
            "sedol": order.sedol,
            "trade_type": order.trade_type,
            "quantity": order.quantity,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hargreaves::{CategoryCode, Side};

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            let request = DealRequest::new("LLOY", 70, Side::Sell, 50.0).unwrap();
            log_deal_started(&mut log, &request).unwrap();
            log_security_resolved(
                &mut log,
                &SearchResult {
                    ticker: "LLOY".into(),
                    name: "Lloyds Banking Group plc".into(),
                    sedol: "0870612".into(),
                    internet_allowed: true,
                    category: CategoryCode::Equity,
                },
            )
            .unwrap();
            log_user_confirmed(&mut log, false).unwrap();
        }

        let events = lines(&path);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "deal_started");
        assert_eq!(events[0]["side"], "Sell");
        assert_eq!(events[0]["account"], 70);
        assert_eq!(events[1]["sedol"], "0870612");
        assert_eq!(events[1]["category"], "E");
        assert_eq!(events[2]["approved"], false);
        assert!(events[2]["ts"].is_string());
    }

    #[test]
    fn audit_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        for _ in 0..2 {
            let mut log = AuditLog::open(&path).unwrap();
            log_user_confirmed(&mut log, true).unwrap();
        }
        assert_eq!(lines(&path).len(), 2);
    }
}
