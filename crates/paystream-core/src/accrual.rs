//! Accrual engine
//!
//! Derives, at any instant, how much salary an employee has earned
//! and how much remains withdrawable, from a cached snapshot and
//! "now". Pure and reentrant: no I/O, no side effects, safe to call
//! at arbitrary frequency from any number of tasks.

use serde::{Deserialize, Serialize};

use crate::types::StreamSnapshot;

/// Derived balances for one stream. Recomputed on every tick, never
/// persisted. `PartialEq` lets callers publish only on change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccrualResult {
    /// Accrued-to-date total: streamed since the last checkpoint
    /// plus the unrealized carry-over.
    pub current_balance: u128,
    /// `max(0, current_balance - total_withdrawn)`.
    pub available_balance: u128,
    /// Floor-divided per-second rate in force.
    pub rate_per_second: u128,
    /// Seconds of streaming reflected in `current_balance`.
    pub elapsed_seconds: u64,
    /// Lifetime earnings: streamed plus the on-chain earned
    /// checkpoint.
    pub total_earned: u128,
    pub is_streaming: bool,
}

/// Derive current balances for a stream at `now`.
///
/// When either gating flag is off the stream is frozen: the result
/// carries only the unrealized balance and `is_streaming` is false.
/// The per-second rate uses truncating integer division; the
/// fractional remainder is never distributed. The external ledger
/// truncates identically, so the derived balance matches the
/// authoritative on-chain balance at withdrawal time.
pub fn derive_accrual(snapshot: &StreamSnapshot, now: i64) -> AccrualResult {
    if !snapshot.streaming_active || !snapshot.employee_active || snapshot.period_seconds == 0 {
        return AccrualResult {
            current_balance: snapshot.unrealized_balance,
            available_balance: snapshot
                .unrealized_balance
                .saturating_sub(snapshot.total_withdrawn),
            rate_per_second: 0,
            elapsed_seconds: 0,
            total_earned: snapshot.total_earned,
            is_streaming: false,
        };
    }

    let rate_per_second = snapshot.rate_per_period / snapshot.period_seconds as u128;

    // A stale snapshot only makes elapsed larger; a snapshot whose
    // basis is in the future contributes nothing yet.
    let basis = snapshot.stream_start_time.max(snapshot.last_balance_update);
    let elapsed_seconds = now.saturating_sub(basis).max(0) as u64;

    let streamed = rate_per_second.saturating_mul(elapsed_seconds as u128);
    let current_balance = streamed.saturating_add(snapshot.unrealized_balance);
    let available_balance = current_balance.saturating_sub(snapshot.total_withdrawn);

    AccrualResult {
        current_balance,
        available_balance,
        rate_per_second,
        elapsed_seconds,
        total_earned: streamed.saturating_add(snapshot.total_earned),
        is_streaming: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PERIOD_MONTHLY;

    const T: i64 = 1_700_000_000;

    fn unit_per_second_snapshot() -> StreamSnapshot {
        StreamSnapshot {
            rate_per_period: PERIOD_MONTHLY as u128,
            period_seconds: PERIOD_MONTHLY,
            stream_start_time: T,
            last_balance_update: T,
            unrealized_balance: 0,
            total_earned: 0,
            total_withdrawn: 0,
            streaming_active: true,
            employee_active: true,
        }
    }

    #[test]
    fn test_one_unit_per_second_accrues_linearly() {
        let result = derive_accrual(&unit_per_second_snapshot(), T + 100);
        assert_eq!(result.rate_per_second, 1);
        assert_eq!(result.current_balance, 100);
        assert_eq!(result.available_balance, 100);
        assert!(result.is_streaming);
    }

    #[test]
    fn test_withdrawn_reduces_available_not_current() {
        let snapshot = StreamSnapshot {
            total_withdrawn: 40,
            ..unit_per_second_snapshot()
        };
        let result = derive_accrual(&snapshot, T + 100);
        assert_eq!(result.current_balance, 100);
        assert_eq!(result.available_balance, 60);
    }

    #[test]
    fn test_inactive_stream_is_frozen_regardless_of_now() {
        for inactive in [
            StreamSnapshot {
                streaming_active: false,
                ..unit_per_second_snapshot()
            },
            StreamSnapshot {
                employee_active: false,
                ..unit_per_second_snapshot()
            },
        ] {
            let snapshot = StreamSnapshot {
                unrealized_balance: 25,
                total_withdrawn: 10,
                ..inactive
            };
            for now in [T, T + 1, T + 1_000_000] {
                let result = derive_accrual(&snapshot, now);
                assert!(!result.is_streaming);
                assert_eq!(result.current_balance, 25);
                assert_eq!(result.available_balance, 15);
            }
        }
    }

    #[test]
    fn test_unrealized_balance_carries_into_current() {
        let snapshot = StreamSnapshot {
            unrealized_balance: 500,
            ..unit_per_second_snapshot()
        };
        let result = derive_accrual(&snapshot, T + 30);
        assert_eq!(result.current_balance, 530);
    }

    #[test]
    fn test_rate_division_truncates_toward_zero() {
        let snapshot = StreamSnapshot {
            rate_per_period: 10,
            period_seconds: 3,
            ..unit_per_second_snapshot()
        };
        let result = derive_accrual(&snapshot, T + 9);
        // 10 / 3 == 3; the remainder is never distributed.
        assert_eq!(result.rate_per_second, 3);
        assert_eq!(result.current_balance, 27);
    }

    #[test]
    fn test_future_basis_contributes_nothing_yet() {
        let snapshot = StreamSnapshot {
            stream_start_time: T + 1_000,
            ..unit_per_second_snapshot()
        };
        let result = derive_accrual(&snapshot, T + 100);
        assert_eq!(result.elapsed_seconds, 0);
        assert_eq!(result.current_balance, 0);
    }

    #[test]
    fn test_basis_is_max_of_start_and_checkpoint() {
        let snapshot = StreamSnapshot {
            stream_start_time: T,
            last_balance_update: T + 50,
            unrealized_balance: 50,
            ..unit_per_second_snapshot()
        };
        // Streaming resumes from the checkpoint, not the start.
        let result = derive_accrual(&snapshot, T + 80);
        assert_eq!(result.elapsed_seconds, 30);
        assert_eq!(result.current_balance, 80);
    }

    #[test]
    fn test_available_is_monotone_in_now_at_fixed_baseline() {
        let snapshot = StreamSnapshot {
            total_withdrawn: 17,
            unrealized_balance: 4,
            ..unit_per_second_snapshot()
        };
        let mut previous = 0;
        for offset in 0..300 {
            let result = derive_accrual(&snapshot, T + offset);
            assert!(result.available_balance >= previous);
            previous = result.available_balance;
        }
    }

    #[test]
    fn test_withdrawn_above_current_clamps_available_to_zero() {
        let snapshot = StreamSnapshot {
            total_withdrawn: 1_000,
            ..unit_per_second_snapshot()
        };
        let result = derive_accrual(&snapshot, T + 10);
        assert_eq!(result.available_balance, 0);
    }

    #[test]
    fn test_zero_period_is_treated_as_no_stream() {
        let snapshot = StreamSnapshot {
            period_seconds: 0,
            unrealized_balance: 9,
            ..unit_per_second_snapshot()
        };
        let result = derive_accrual(&snapshot, T + 100);
        assert!(!result.is_streaming);
        assert_eq!(result.current_balance, 9);
    }
}
