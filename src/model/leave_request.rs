use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_WITHDRAWN: &str = "withdrawn";

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub tenant_id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Business-day count charged against the balance.
    #[schema(example = 5.0)]
    pub days: f64,
    #[schema(example = "Family trip")]
    pub reason: String,
    /// Only populated for sick leave.
    #[schema(nullable = true)]
    pub medical_certificate_url: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-02-20T08:30:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}
