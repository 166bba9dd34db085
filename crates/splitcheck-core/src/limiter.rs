//! Per-user extraction attempt limiter
//!
//! A user gets `max_attempts_per_window` extraction calls per window. The
//! window is anchored at the first attempt after a reset and only moves when
//! a full `cooldown_window_ms` has passed since that anchor; attempts inside
//! the window leave the anchor where it is.
//!
//! This module only decides. Reading and persisting [`AttemptState`] is the
//! caller's job (see [`crate::service::ExtractionService`]), and the
//! read-then-write is not transactional: two concurrent requests for the same
//! user can both be granted the last slot.

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AttemptState, RateLimitPolicy};

/// Outcome of an allowed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptDecision {
    /// State to persist once the extraction succeeds
    pub next: AttemptState,
    /// Attempts still available in the current window after this one
    pub attempts_left: u32,
}

/// Decide whether a new extraction attempt is allowed at `now_ms`
///
/// Returns [`Error::RateLimitExceeded`] when the window is exhausted; in that
/// case the previous state must be left untouched.
pub fn evaluate_attempt(
    previous: Option<&AttemptState>,
    policy: &RateLimitPolicy,
    now_ms: i64,
) -> Result<AttemptDecision> {
    let fresh = AttemptDecision {
        next: AttemptState {
            last_attempt_timestamp_ms: now_ms,
            attempts: 1,
        },
        attempts_left: policy.max_attempts_per_window.saturating_sub(1),
    };

    let Some(previous) = previous else {
        debug!("First extraction attempt for user");
        return Ok(fresh);
    };

    let elapsed = now_ms.saturating_sub(previous.last_attempt_timestamp_ms);
    if elapsed >= policy.cooldown_window_ms {
        debug!(elapsed_ms = elapsed, "Attempt window reset");
        return Ok(fresh);
    }

    let next_attempts = previous.attempts.saturating_add(1);
    if next_attempts > policy.max_attempts_per_window {
        let wait_time_ms = policy.cooldown_window_ms.saturating_sub(elapsed);
        debug!(
            attempts = previous.attempts,
            wait_time_ms, "Attempt window exhausted"
        );
        return Err(Error::RateLimitExceeded {
            attempts_left: 0,
            wait_time_ms,
        });
    }

    Ok(AttemptDecision {
        next: AttemptState {
            last_attempt_timestamp_ms: previous.last_attempt_timestamp_ms,
            attempts: next_attempts,
        },
        attempts_left: policy.max_attempts_per_window - next_attempts,
    })
}

/// Attempts a user could still make at `now_ms`, without recording one
pub fn attempts_remaining(
    previous: Option<&AttemptState>,
    policy: &RateLimitPolicy,
    now_ms: i64,
) -> u32 {
    match previous {
        Some(state)
            if now_ms.saturating_sub(state.last_attempt_timestamp_ms)
                < policy.cooldown_window_ms =>
        {
            policy.max_attempts_per_window.saturating_sub(state.attempts)
        }
        _ => policy.max_attempts_per_window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(cooldown_window_ms: i64, max_attempts_per_window: u32) -> RateLimitPolicy {
        RateLimitPolicy {
            cooldown_window_ms,
            max_attempts_per_window,
            extraction_prompt: "Read data from receipt image".into(),
            model_identifier: "gemini-2.0-flash".into(),
        }
    }

    #[test]
    fn test_first_attempt() {
        let decision = evaluate_attempt(None, &policy(60_000, 3), 1_000).unwrap();
        assert_eq!(decision.attempts_left, 2);
        assert_eq!(
            decision.next,
            AttemptState {
                last_attempt_timestamp_ms: 1_000,
                attempts: 1
            }
        );
    }

    #[test]
    fn test_attempts_exhaust_within_window() {
        let policy = policy(60_000, 3);
        let first = evaluate_attempt(None, &policy, 0).unwrap();
        let second = evaluate_attempt(Some(&first.next), &policy, 10).unwrap();
        assert_eq!(second.attempts_left, 1);
        let third = evaluate_attempt(Some(&second.next), &policy, 20).unwrap();
        assert_eq!(third.attempts_left, 0);
        assert_eq!(third.next.attempts, 3);

        let err = evaluate_attempt(Some(&third.next), &policy, 30).unwrap_err();
        match err {
            Error::RateLimitExceeded {
                attempts_left,
                wait_time_ms,
            } => {
                assert_eq!(attempts_left, 0);
                assert_eq!(wait_time_ms, 59_970);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_window_anchor_does_not_move_inside_window() {
        let previous = AttemptState {
            last_attempt_timestamp_ms: 5_000,
            attempts: 1,
        };
        let decision = evaluate_attempt(Some(&previous), &policy(60_000, 3), 50_000).unwrap();
        assert_eq!(decision.next.last_attempt_timestamp_ms, 5_000);
        assert_eq!(decision.next.attempts, 2);
    }

    #[test]
    fn test_window_resets_at_exact_boundary() {
        let previous = AttemptState {
            last_attempt_timestamp_ms: 0,
            attempts: 3,
        };
        let decision = evaluate_attempt(Some(&previous), &policy(60_000, 3), 60_000).unwrap();
        assert_eq!(decision.attempts_left, 2);
        assert_eq!(
            decision.next,
            AttemptState {
                last_attempt_timestamp_ms: 60_000,
                attempts: 1
            }
        );
    }

    #[test]
    fn test_denied_one_ms_before_reset() {
        let previous = AttemptState {
            last_attempt_timestamp_ms: 0,
            attempts: 3,
        };
        let err = evaluate_attempt(Some(&previous), &policy(60_000, 3), 59_999).unwrap_err();
        assert!(matches!(
            err,
            Error::RateLimitExceeded {
                wait_time_ms: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let policy = policy(60_000, 1);
        let ancient = AttemptState {
            last_attempt_timestamp_ms: i64::MIN,
            attempts: 1,
        };
        let decision = evaluate_attempt(Some(&ancient), &policy, 1_000).unwrap();
        assert_eq!(decision.next.last_attempt_timestamp_ms, 1_000);
        assert_eq!(attempts_remaining(Some(&ancient), &policy, 1_000), 1);

        let future = AttemptState {
            last_attempt_timestamp_ms: i64::MAX,
            attempts: 1,
        };
        let err = evaluate_attempt(Some(&future), &policy, -1).unwrap_err();
        assert!(matches!(
            err,
            Error::RateLimitExceeded {
                wait_time_ms: i64::MAX,
                ..
            }
        ));
        assert_eq!(err.wait_seconds(), Some(i64::MAX / 1000));
        assert_eq!(attempts_remaining(Some(&future), &policy, -1), 0);
    }

    #[test]
    fn test_attempts_remaining() {
        let policy = policy(60_000, 5);
        let state = AttemptState {
            last_attempt_timestamp_ms: 1_000,
            attempts: 3,
        };

        assert_eq!(attempts_remaining(None, &policy, 0), 5);
        assert_eq!(attempts_remaining(Some(&state), &policy, 2_000), 2);
        // Window expired
        assert_eq!(attempts_remaining(Some(&state), &policy, 61_000), 5);
    }

    #[test]
    fn test_zero_allowance_still_saturates() {
        let decision = evaluate_attempt(None, &policy(60_000, 0), 0).unwrap();
        assert_eq!(decision.attempts_left, 0);

        let err = evaluate_attempt(Some(&decision.next), &policy(60_000, 0), 1).unwrap_err();
        assert!(matches!(err, Error::RateLimitExceeded { .. }));
    }
}
