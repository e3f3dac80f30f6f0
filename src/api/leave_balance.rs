use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::leave_type::LeaveType;
use crate::utils::settings_cache::SettingsCache;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Balance year; defaults to the current year.
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 12.5)]
    pub balance: f64,
    /// True when no stored row exists and the value is the org policy
    /// default, synthesized in memory and never persisted.
    #[schema(example = false)]
    pub is_org_default: bool,
    /// True when the stored balance is negative; the employee is expected to
    /// trigger a balance reset rather than the read path guessing a fix.
    #[schema(example = false)]
    pub needs_reset: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub success: bool,
    pub balances: Vec<BalanceEntry>,
    /// Full entitlement map for all six types, policy or fallback.
    #[schema(value_type = Object)]
    pub org_policies: HashMap<LeaveType, f64>,
}

/// Employee-facing balance view. Only the three everyday types are shown;
/// maternity/paternity/unpaid stay admin-side even though allocation and
/// reset cover them.
#[utoipa::path(
    get,
    path = "/api/employee/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balances for the session employee", body = BalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn get_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_or_forbidden()?;
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let settings = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tenant_id = auth.tenant_id, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // One authoritative row per (employee, type, year); the unique key on
    // leave_balances makes duplicate or stray future-year rows impossible.
    let rows = sqlx::query_as::<_, (String, f64)>(
        r#"
        SELECT leave_type, balance
        FROM leave_balances
        WHERE tenant_id = ? AND employee_id = ? AND year = ?
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch leave balances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let stored: HashMap<String, f64> = rows.into_iter().collect();

    let balances = LeaveType::display_types()
        .into_iter()
        .map(|leave_type| match stored.get(leave_type.as_str()) {
            Some(&balance) => BalanceEntry {
                leave_type,
                year,
                balance,
                is_org_default: false,
                needs_reset: balance < 0.0,
            },
            None => BalanceEntry {
                leave_type,
                year,
                balance: settings.policy_days(leave_type),
                is_org_default: true,
                needs_reset: false,
            },
        })
        .collect();

    let org_policies = LeaveType::iter()
        .map(|t| (t, settings.policy_days(t)))
        .collect();

    Ok(HttpResponse::Ok().json(BalanceResponse {
        success: true,
        balances,
        org_policies,
    }))
}
