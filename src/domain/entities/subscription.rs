use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const BILLING_CYCLE_DAYS: i64 = 30;

/// A user's binding to a plan, joined with the plan fields the quota check needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub operations_used: i32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub is_active: bool,
    pub plan_name: String,
    pub max_operations: i32,
}

impl Subscription {
    pub fn has_operations_remaining(&self) -> bool {
        self.operations_used < self.max_operations
    }

    pub fn operations_remaining(&self) -> i32 {
        (self.max_operations - self.operations_used).max(0)
    }
}

/// Start and end of a billing window opening at `start`.
pub fn billing_window(start: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    (start, start + Duration::days(BILLING_CYCLE_DAYS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(used: i32, max: i32) -> Subscription {
        let (start_date, end_date) = billing_window(chrono::Utc::now().naive_utc());
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            operations_used: used,
            start_date,
            end_date,
            is_active: true,
            plan_name: "FREE".to_string(),
            max_operations: max,
        }
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        assert_eq!(subscription(3, 5).operations_remaining(), 2);
        assert_eq!(subscription(7, 5).operations_remaining(), 0);
    }

    #[test]
    fn quota_boundary_is_exclusive() {
        assert!(subscription(4, 5).has_operations_remaining());
        assert!(!subscription(5, 5).has_operations_remaining());
    }

    #[test]
    fn billing_window_is_thirty_days() {
        let now = chrono::Utc::now().naive_utc();
        let (start, end) = billing_window(now);
        assert_eq!(start, now);
        assert_eq!(end - start, Duration::days(30));
    }
}
