use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::model::leave_type::LeaveType;

/// Map of leave type to annual entitlement in days.
pub type LeavePolicies = HashMap<LeaveType, f64>;

/// Per-tenant leave policy knobs. One row per tenant; every leave operation
/// reads this (through the settings cache) before touching balances.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[schema(example = 1)]
    pub tenant_id: u64,

    /// JSON column: `{"annual": 20, "sick": 10, ...}`
    #[schema(value_type = Object)]
    pub leave_policies: Json<LeavePolicies>,

    #[schema(example = true)]
    pub carry_forward_leave: bool,

    #[schema(example = 10)]
    pub max_carry_forward_days: i64,

    #[schema(example = 1)]
    pub minimum_leave_notice_days: i64,

    #[schema(example = 15, nullable = true)]
    pub maximum_consecutive_leave_days: Option<i64>,

    #[schema(example = true)]
    pub allow_half_day_leave: bool,

    #[schema(example = false)]
    pub auto_allocate_leave: bool,

    /// "MM-DD" day-of-year on which the yearly allocation runs.
    #[schema(example = "01-01")]
    pub leave_allocation_day: String,
}

impl TenantSettings {
    /// In-memory defaults used when a tenant has no settings row yet.
    /// Never persisted.
    pub fn org_defaults(tenant_id: u64) -> Self {
        TenantSettings {
            tenant_id,
            leave_policies: Json(HashMap::new()),
            carry_forward_leave: false,
            max_carry_forward_days: 0,
            minimum_leave_notice_days: 1,
            maximum_consecutive_leave_days: None,
            allow_half_day_leave: false,
            auto_allocate_leave: false,
            leave_allocation_day: "01-01".to_string(),
        }
    }

    /// Entitlement for a leave type: tenant policy entry, else the hardcoded
    /// fallback for that type.
    pub fn policy_days(&self, leave_type: LeaveType) -> f64 {
        self.leave_policies
            .get(&leave_type)
            .copied()
            .unwrap_or_else(|| leave_type.default_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_falls_back_to_hardcoded_defaults() {
        let settings = TenantSettings::org_defaults(7);
        assert_eq!(settings.policy_days(LeaveType::Annual), 20.0);
        assert_eq!(settings.policy_days(LeaveType::Unpaid), 0.0);
    }

    #[test]
    fn policy_map_wins_over_defaults() {
        let mut settings = TenantSettings::org_defaults(7);
        settings.leave_policies.insert(LeaveType::Annual, 25.0);
        assert_eq!(settings.policy_days(LeaveType::Annual), 25.0);
        assert_eq!(settings.policy_days(LeaveType::Sick), 10.0);
    }
}
