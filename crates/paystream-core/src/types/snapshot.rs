//! Stream snapshot types
//!
//! A snapshot is a cached, possibly stale, read of the external
//! ledger/indexer state for one employee stream. Snapshots are
//! copy-on-read: the accrual engine never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One full period granted daily.
pub const PERIOD_DAILY: u64 = 86_400;
/// One full period granted weekly.
pub const PERIOD_WEEKLY: u64 = 604_800;
/// One full period granted monthly (30 days).
pub const PERIOD_MONTHLY: u64 = 2_592_000;
/// One full period granted yearly (365 days).
pub const PERIOD_YEARLY: u64 = 31_536_000;

/// Strongly-typed identifier for the entity a stream belongs to
/// (an employee within one organization).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Point-in-time read of a stream account.
///
/// All amounts are in the smallest token unit; all times are unix
/// seconds. Accrual is frozen unless both gating flags are true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreamSnapshot {
    /// Total salary granted per period, smallest unit.
    pub rate_per_period: u128,
    /// Length of one period in seconds.
    pub period_seconds: u64,
    /// When the current streaming window began.
    pub stream_start_time: i64,
    /// Last time the balance fields below were checkpointed on-chain.
    pub last_balance_update: i64,
    /// Balance accrued but not yet reconciled into the live formula
    /// (carried over from a rate change).
    pub unrealized_balance: u128,
    /// Earnings already checkpointed on-chain before this window.
    pub total_earned: u128,
    /// Cumulative amount withdrawn since account creation.
    pub total_withdrawn: u128,
    /// Whether the stream itself is active.
    pub streaming_active: bool,
    /// Whether the employee is active in the organization.
    pub employee_active: bool,
}

/// Serde facade for snapshots as the indexer returns them.
///
/// Amount fields arrive as decimal strings and any field may be
/// missing entirely (an account with no stream yet). Resolution is
/// infallible: absent or malformed fields become zero so the caller
/// always gets the "no stream yet" shape instead of an error.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStreamSnapshot {
    #[serde(default)]
    pub rate_per_period: Option<String>,
    #[serde(default)]
    pub period_seconds: Option<u64>,
    #[serde(default)]
    pub stream_start_time: Option<i64>,
    #[serde(default)]
    pub last_balance_update: Option<i64>,
    #[serde(default)]
    pub unrealized_balance: Option<String>,
    #[serde(default)]
    pub total_earned: Option<String>,
    #[serde(default)]
    pub total_withdrawn: Option<String>,
    #[serde(default)]
    pub streaming_active: Option<bool>,
    #[serde(default)]
    pub employee_active: Option<bool>,
}

impl RawStreamSnapshot {
    /// Resolve into a concrete snapshot, defaulting the period to a
    /// preset when the organization did not supply one.
    pub fn resolve(&self, default_period_seconds: u64) -> StreamSnapshot {
        StreamSnapshot {
            rate_per_period: parse_units(&self.rate_per_period),
            period_seconds: self.period_seconds.unwrap_or(default_period_seconds),
            stream_start_time: self.stream_start_time.unwrap_or(0),
            last_balance_update: self.last_balance_update.unwrap_or(0),
            unrealized_balance: parse_units(&self.unrealized_balance),
            total_earned: parse_units(&self.total_earned),
            total_withdrawn: parse_units(&self.total_withdrawn),
            streaming_active: self.streaming_active.unwrap_or(false),
            employee_active: self.employee_active.unwrap_or(false),
        }
    }
}

impl From<RawStreamSnapshot> for StreamSnapshot {
    fn from(raw: RawStreamSnapshot) -> Self {
        raw.resolve(PERIOD_MONTHLY)
    }
}

fn parse_units(field: &Option<String>) -> u128 {
    field
        .as_deref()
        .map(str::trim)
        .and_then(|s| s.parse::<u128>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_snapshot_with_all_fields_resolves() {
        let raw: RawStreamSnapshot = serde_json::from_value(serde_json::json!({
            "rate_per_period": "2592000000000000000000000",
            "period_seconds": PERIOD_MONTHLY,
            "stream_start_time": 1_700_000_000,
            "last_balance_update": 1_700_000_000,
            "unrealized_balance": "5",
            "total_earned": "7",
            "total_withdrawn": "3",
            "streaming_active": true,
            "employee_active": true
        }))
        .unwrap();

        let snapshot = raw.resolve(PERIOD_MONTHLY);
        assert_eq!(snapshot.rate_per_period, 2_592_000_000_000_000_000_000_000);
        assert_eq!(snapshot.period_seconds, PERIOD_MONTHLY);
        assert_eq!(snapshot.unrealized_balance, 5);
        assert_eq!(snapshot.total_earned, 7);
        assert_eq!(snapshot.total_withdrawn, 3);
        assert!(snapshot.streaming_active);
        assert!(snapshot.employee_active);
    }

    #[test]
    fn test_missing_fields_resolve_to_no_stream_shape() {
        let raw: RawStreamSnapshot = serde_json::from_value(serde_json::json!({})).unwrap();
        let snapshot = raw.resolve(PERIOD_MONTHLY);

        assert_eq!(snapshot.rate_per_period, 0);
        assert_eq!(snapshot.period_seconds, PERIOD_MONTHLY);
        assert_eq!(snapshot.unrealized_balance, 0);
        assert!(!snapshot.streaming_active);
        assert!(!snapshot.employee_active);
    }

    #[test]
    fn test_malformed_amount_resolves_to_zero() {
        let raw = RawStreamSnapshot {
            rate_per_period: Some("not-a-number".to_string()),
            unrealized_balance: Some("-12".to_string()),
            streaming_active: Some(true),
            ..Default::default()
        };
        let snapshot = raw.resolve(PERIOD_WEEKLY);

        assert_eq!(snapshot.rate_per_period, 0);
        assert_eq!(snapshot.unrealized_balance, 0);
        assert_eq!(snapshot.period_seconds, PERIOD_WEEKLY);
    }

    #[test]
    fn test_entity_id_conversions() {
        let id = EntityId::from("org-1:emp-7");
        assert_eq!(id.as_str(), "org-1:emp-7");
        assert_eq!(id.to_string(), "org-1:emp-7");
        assert_eq!(String::from(id), "org-1:emp-7");
    }
}
