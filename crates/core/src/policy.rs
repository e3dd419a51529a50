//! Order cancellation policy.
//!
//! A customer may cancel an order only while it is still open (`pending` or
//! `processing`) and only within a fixed window after the order was placed.
//! Both conditions are required, and each failure carries its own reason so
//! the storefront can tell the customer which one bit them.
//!
//! The listing UI uses [`is_cancellable`] to decide whether to offer a cancel
//! action; the cancel endpoint re-runs [`check_cancellable`] authoritatively
//! before writing anything. The UI check is an affordance, never a security
//! boundary.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::OrderStatus;

/// How long after `createdAt` a customer may cancel an order.
///
/// Policy constant - the single place the window is defined.
pub const CANCELLATION_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Why an order cannot be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CancelDenied {
    /// The cancellation window has elapsed.
    #[error("order can no longer be cancelled: the cancellation window has elapsed")]
    WindowElapsed {
        /// When the window closed.
        deadline: DateTime<Utc>,
    },
    /// The order has advanced past the open statuses.
    #[error("order cannot be cancelled in {status} status")]
    WrongStatus {
        /// The status the order is in.
        status: OrderStatus,
    },
}

/// The instant the cancellation window closes for an order placed at
/// `created_at`.
#[must_use]
pub fn cancellation_deadline(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + CANCELLATION_WINDOW
}

/// Check whether an order may be cancelled at `now`.
///
/// # Errors
///
/// Returns [`CancelDenied::WindowElapsed`] once `now` reaches the deadline,
/// otherwise [`CancelDenied::WrongStatus`] if the order has left the open
/// statuses. When both conditions fail, the window reason wins.
pub fn check_cancellable(
    status: OrderStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), CancelDenied> {
    let deadline = cancellation_deadline(created_at);
    if now >= deadline {
        return Err(CancelDenied::WindowElapsed { deadline });
    }
    if !status.is_open() {
        return Err(CancelDenied::WrongStatus { status });
    }
    Ok(())
}

/// Boolean form of [`check_cancellable`], for deriving the cancel affordance
/// in listings.
#[must_use]
pub fn is_cancellable(
    status: OrderStatus,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    check_cancellable(status, created_at, now).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn placed_at() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_open_order_inside_window() {
        let t = placed_at();
        for status in [OrderStatus::Pending, OrderStatus::Processing] {
            assert!(is_cancellable(status, t, t));
            assert!(is_cancellable(status, t, t + TimeDelta::minutes(5)));
        }
    }

    #[test]
    fn test_window_boundary() {
        let t = placed_at();

        // One second before the deadline: still allowed
        assert!(is_cancellable(
            OrderStatus::Pending,
            t,
            t + TimeDelta::minutes(9) + TimeDelta::seconds(59)
        ));

        // At the deadline exactly: the window is closed
        assert!(!is_cancellable(
            OrderStatus::Pending,
            t,
            t + TimeDelta::minutes(10)
        ));

        // Just past the deadline
        let denied = check_cancellable(
            OrderStatus::Pending,
            t,
            t + TimeDelta::minutes(10) + TimeDelta::seconds(1),
        )
        .unwrap_err();
        assert!(matches!(denied, CancelDenied::WindowElapsed { .. }));
    }

    #[test]
    fn test_window_elapsed_regardless_of_status() {
        let t = placed_at();
        let late = t + TimeDelta::minutes(11);
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!is_cancellable(status, t, late));
        }
    }

    #[test]
    fn test_advanced_status_regardless_of_time() {
        let t = placed_at();
        let early = t + TimeDelta::seconds(30);
        for status in [
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let denied = check_cancellable(status, t, early).unwrap_err();
            assert_eq!(denied, CancelDenied::WrongStatus { status });
        }
    }

    #[test]
    fn test_window_reason_wins_when_both_fail() {
        let t = placed_at();
        let denied =
            check_cancellable(OrderStatus::Shipped, t, t + TimeDelta::hours(1)).unwrap_err();
        assert!(matches!(denied, CancelDenied::WindowElapsed { .. }));
    }

    #[test]
    fn test_deadline_is_ten_minutes_out() {
        let t = placed_at();
        assert_eq!(cancellation_deadline(t), t + TimeDelta::minutes(10));
    }

    #[test]
    fn test_denied_messages_are_distinct() {
        let t = placed_at();
        let window = CancelDenied::WindowElapsed {
            deadline: cancellation_deadline(t),
        };
        let status = CancelDenied::WrongStatus {
            status: OrderStatus::Shipped,
        };
        assert!(window.to_string().contains("window"));
        assert!(status.to_string().contains("shipped"));
    }
}
