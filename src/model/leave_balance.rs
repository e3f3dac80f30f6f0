use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One authoritative row per (employee, leave type, year) — the table carries
/// a UNIQUE key on that triple, so the read path never has to reconcile
/// duplicates. Balance is signed: a negative value means spend exceeded
/// allocation and the row needs an explicit reset.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub tenant_id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 17.5)]
    pub balance: f64,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}
