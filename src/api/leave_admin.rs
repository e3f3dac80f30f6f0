use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::leave_type::LeaveType;
use crate::model::tenant_settings::TenantSettings;
use crate::utils::audit;
use crate::utils::leave_math::allocation_for;
use crate::utils::settings_cache::SettingsCache;

/// Types the allocation batch walks: the tenant's policy map when it has
/// entries, else all six.
fn configured_types(settings: &TenantSettings) -> Vec<LeaveType> {
    if settings.leave_policies.is_empty() {
        LeaveType::iter().collect()
    } else {
        LeaveType::iter()
            .filter(|t| settings.leave_policies.contains_key(t))
            .collect()
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    #[schema(example = 2026)]
    pub year: i32,
    /// Defaults to every ACTIVE employee of the tenant.
    #[schema(nullable = true)]
    pub employee_ids: Option<Vec<u64>>,
    /// Prorate ANNUAL for mid-year hires. Defaults to true.
    #[schema(example = true, nullable = true)]
    pub prorated: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = 20.0)]
    pub allocated: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationError {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub error: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub success: bool,
    #[schema(example = 12)]
    pub total_employees: usize,
    #[schema(example = 11)]
    pub success_count: usize,
    #[schema(example = 1)]
    pub error_count: usize,
    pub allocations: Vec<AllocationEntry>,
    pub errors: Vec<AllocationError>,
}

#[derive(sqlx::FromRow)]
struct AllocationTarget {
    id: u64,
    first_name: String,
    last_name: String,
    hire_date: NaiveDate,
}

/* =========================
Yearly allocation batch
========================= */
/// One transaction per employee: either all of an employee's leave types are
/// written for the year or none are. The batch itself tolerates per-employee
/// failures and reports them instead of aborting.
#[utoipa::path(
    post,
    path = "/api/admin/leave/allocate",
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Batch result", body = AllocationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Admin"
)]
pub async fn allocate_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
    payload: web::Json<AllocateRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let prorated = payload.prorated.unwrap_or(true);

    let settings = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let employees = fetch_targets(pool.get_ref(), auth.tenant_id, payload.employee_ids.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch allocation targets");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let types = configured_types(&settings);

    let mut allocations = Vec::new();
    let mut errors = Vec::new();
    let mut success_count = 0usize;

    for employee in &employees {
        match allocate_employee(
            pool.get_ref(),
            &settings,
            &types,
            auth.tenant_id,
            employee,
            payload.year,
            prorated,
        )
        .await
        {
            Ok(mut entries) => {
                allocations.append(&mut entries);
                success_count += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, employee_id = employee.id, "Allocation failed for employee");
                errors.push(AllocationError {
                    employee_id: employee.id,
                    error: e.to_string(),
                });
            }
        }
    }

    audit::record(
        pool.get_ref(),
        auth.tenant_id,
        auth.user_id,
        "leave.allocate",
        "leave_balance",
        None,
        serde_json::json!({
            "year": payload.year,
            "prorated": prorated,
            "totalEmployees": employees.len(),
            "errorCount": errors.len(),
        }),
    )
    .await;

    Ok(HttpResponse::Ok().json(AllocationResponse {
        success: true,
        total_employees: employees.len(),
        success_count,
        error_count: errors.len(),
        allocations,
        errors,
    }))
}

async fn fetch_targets(
    pool: &MySqlPool,
    tenant_id: u64,
    employee_ids: Option<&[u64]>,
) -> Result<Vec<AllocationTarget>, sqlx::Error> {
    match employee_ids {
        Some(ids) if !ids.is_empty() => {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "SELECT id, first_name, last_name, hire_date FROM employees \
                 WHERE tenant_id = ? AND id IN ({})",
                placeholders
            );
            let mut q = sqlx::query_as::<_, AllocationTarget>(&sql).bind(tenant_id);
            for id in ids {
                q = q.bind(id);
            }
            q.fetch_all(pool).await
        }
        _ => {
            sqlx::query_as::<_, AllocationTarget>(
                "SELECT id, first_name, last_name, hire_date FROM employees \
                 WHERE tenant_id = ? AND status = 'active'",
            )
            .bind(tenant_id)
            .fetch_all(pool)
            .await
        }
    }
}

async fn allocate_employee(
    pool: &MySqlPool,
    settings: &TenantSettings,
    types: &[LeaveType],
    tenant_id: u64,
    employee: &AllocationTarget,
    year: i32,
    prorated: bool,
) -> Result<Vec<AllocationEntry>, sqlx::Error> {
    // Carry-forward needs last year's annual leftover, read outside the
    // transaction; it is not mutated by this batch.
    let prior_annual = if settings.carry_forward_leave {
        sqlx::query_scalar::<_, f64>(
            r#"
            SELECT balance
            FROM leave_balances
            WHERE tenant_id = ? AND employee_id = ? AND leave_type = ? AND year = ?
            "#,
        )
        .bind(tenant_id)
        .bind(employee.id)
        .bind(LeaveType::Annual.as_str())
        .bind(year - 1)
        .fetch_optional(pool)
        .await?
    } else {
        None
    };

    let mut tx = pool.begin().await?;
    let mut entries = Vec::with_capacity(types.len());

    for &leave_type in types {
        let allocated = allocation_for(
            settings,
            leave_type,
            employee.hire_date,
            year,
            prorated,
            prior_annual,
        );

        // Overwrite semantics: rerunning the batch re-derives the value, it
        // never stacks on top of a previous run.
        sqlx::query(
            r#"
            INSERT INTO leave_balances (tenant_id, employee_id, leave_type, year, balance)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE balance = ?
            "#,
        )
        .bind(tenant_id)
        .bind(employee.id)
        .bind(leave_type.as_str())
        .bind(year)
        .bind(allocated)
        .bind(allocated)
        .execute(&mut *tx)
        .await?;

        entries.push(AllocationEntry {
            employee_id: employee.id,
            leave_type,
            allocated,
        });
    }

    tx.commit().await?;
    Ok(entries)
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AllocationReportQuery {
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationStatus {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub name: String,
    /// Stored balance per type that has a row for the year.
    #[schema(value_type = Object)]
    pub balances: HashMap<LeaveType, f64>,
    /// Types with no stored row for the year.
    pub missing: Vec<LeaveType>,
}

/* =========================
Allocation status report
========================= */
#[utoipa::path(
    get,
    path = "/api/admin/leave/allocate",
    params(AllocationReportQuery),
    responses(
        (status = 200, description = "Per-employee allocation status", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Admin"
)]
pub async fn allocation_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AllocationReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let employees = sqlx::query_as::<_, AllocationTarget>(
        "SELECT id, first_name, last_name, hire_date FROM employees \
         WHERE tenant_id = ? AND status = 'active' ORDER BY id",
    )
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch employees for report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let rows = sqlx::query_as::<_, (u64, String, f64)>(
        "SELECT employee_id, leave_type, balance FROM leave_balances \
         WHERE tenant_id = ? AND year = ?",
    )
    .bind(auth.tenant_id)
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch balances for report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let mut by_employee: HashMap<u64, HashMap<LeaveType, f64>> = HashMap::new();
    for (employee_id, leave_type, balance) in rows {
        if let Ok(leave_type) = leave_type.parse::<LeaveType>() {
            by_employee
                .entry(employee_id)
                .or_default()
                .insert(leave_type, balance);
        }
    }

    let report: Vec<AllocationStatus> = employees
        .into_iter()
        .map(|e| {
            let balances = by_employee.remove(&e.id).unwrap_or_default();
            let missing = LeaveType::iter()
                .filter(|t| !balances.contains_key(t))
                .collect();
            AllocationStatus {
                employee_id: e.id,
                name: format!("{} {}", e.first_name, e.last_name),
                balances,
                missing,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "year": year,
        "employees": report
    })))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[schema(example = 1000)]
    pub employee_id: u64,
    /// Defaults to all six types.
    #[schema(example = "annual", nullable = true)]
    pub leave_type: Option<LeaveType>,
    /// Defaults to the current year.
    #[schema(example = 2026, nullable = true)]
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetEntry {
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = -3.0, nullable = true)]
    pub previous_balance: Option<f64>,
    #[schema(example = 20.0)]
    pub new_balance: f64,
    /// "reset" when a row existed, "created" when one was made.
    #[schema(example = "reset")]
    pub status: &'static str,
}

/* =========================
Balance reset (the designed repair tool)
========================= */
/// Unconditionally overwrites the targeted balances with the tenant's org
/// defaults — this is the recovery path the negative-balance rejection in
/// request creation points employees at.
#[utoipa::path(
    post,
    path = "/api/admin/leave/reset-balance",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Reset result with before/after balances", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your balance and not a manager role"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Admin"
)]
pub async fn reset_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
    payload: web::Json<ResetRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_self_or_manager(payload.employee_id)?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND tenant_id = ?)",
    )
    .bind(payload.employee_id)
    .bind(auth.tenant_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Employee existence check failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if !exists {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "success": false,
            "error": "Employee not found"
        })));
    }

    let settings = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let year = payload.year.unwrap_or_else(|| Utc::now().year());
    let types: Vec<LeaveType> = match payload.leave_type {
        Some(t) => vec![t],
        None => LeaveType::iter().collect(),
    };

    let mut results = Vec::with_capacity(types.len());

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    for leave_type in types {
        let previous = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT balance
            FROM leave_balances
            WHERE tenant_id = ? AND employee_id = ? AND leave_type = ? AND year = ?
            "#,
        )
        .bind(auth.tenant_id)
        .bind(payload.employee_id)
        .bind(leave_type.as_str())
        .bind(year)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read balance before reset");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        let new_balance = settings.policy_days(leave_type);

        sqlx::query(
            r#"
            INSERT INTO leave_balances (tenant_id, employee_id, leave_type, year, balance)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE balance = ?
            "#,
        )
        .bind(auth.tenant_id)
        .bind(payload.employee_id)
        .bind(leave_type.as_str())
        .bind(year)
        .bind(new_balance)
        .bind(new_balance)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Balance reset write failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        results.push(ResetEntry {
            leave_type,
            previous_balance: previous,
            new_balance,
            status: if previous.is_some() { "reset" } else { "created" },
        });
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Reset commit failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    audit::record(
        pool.get_ref(),
        auth.tenant_id,
        auth.user_id,
        "leave.reset_balance",
        "leave_balance",
        Some(payload.employee_id),
        serde_json::json!({
            "year": year,
            "leaveType": payload.leave_type,
        }),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "employeeId": payload.employee_id,
        "year": year,
        "results": results
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_types_default_to_all_six() {
        let settings = TenantSettings::org_defaults(1);
        assert_eq!(configured_types(&settings).len(), 6);
    }

    #[test]
    fn configured_types_follow_the_policy_map() {
        let mut settings = TenantSettings::org_defaults(1);
        settings.leave_policies.insert(LeaveType::Annual, 22.0);
        settings.leave_policies.insert(LeaveType::Sick, 8.0);

        let types = configured_types(&settings);
        assert_eq!(types, vec![LeaveType::Annual, LeaveType::Sick]);
    }
}
