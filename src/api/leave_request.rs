use crate::auth::auth::AuthUser;
use crate::model::leave_request::{
    LeaveRequest, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED, STATUS_WITHDRAWN,
};
use crate::model::leave_type::LeaveType;
use crate::model::role::Role;
use crate::notify::Notifier;
use crate::utils::audit;
use crate::utils::leave_math::{evaluate_request, ranges_overlap};
use crate::utils::settings_cache::SettingsCache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

const REQUEST_COLUMNS: &str = "id, tenant_id, employee_id, leave_type, start_date, end_date, \
    days, reason, medical_certificate_url, status, created_at";

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
    /// Overrides the computed business-day count (half days need the tenant
    /// flag).
    #[schema(example = 2.5, nullable = true)]
    pub days: Option<f64>,
    /// Sick leave only.
    #[schema(nullable = true)]
    pub medical_certificate_url: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MyLeaveFilter {
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 2026)]
    /// Filter by the year the leave starts in
    pub year: Option<i32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    I32(i32),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

fn reject(message: &str, needs_reset: bool) -> HttpResponse {
    if needs_reset {
        HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": message,
            "needsReset": true
        }))
    } else {
        HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": message
        }))
    }
}

async fn fetch_request(
    pool: &MySqlPool,
    tenant_id: u64,
    id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {} FROM leave_requests WHERE id = ? AND tenant_id = ?",
        REQUEST_COLUMNS
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/employee/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object,
         example = json!({
            "success": true,
            "leaveRequest": { "id": 1, "status": "pending" }
         })
        ),
        (status = 400, description = "Validation failure", body = Object, example = json!({
            "success": false,
            "error": "Insufficient leave balance: requested 3 day(s), available 2"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
    notifier: web::Data<Notifier>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_or_forbidden()?;

    // 1. required fields
    if payload.reason.trim().is_empty() {
        return Ok(reject("reason is required", false));
    }

    let settings = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, tenant_id = auth.tenant_id, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // Balance year follows the leave start date.
    let leave_year = payload.start_date.year();

    let stored_balance = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT balance
        FROM leave_balances
        WHERE tenant_id = ? AND employee_id = ? AND leave_type = ? AND year = ?
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(payload.leave_type.as_str())
    .bind(leave_year)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let available = stored_balance.unwrap_or_else(|| settings.policy_days(payload.leave_type));

    // 2..6: day count, date order, notice, consecutive cap, balance
    let today = Utc::now().date_naive();
    let days = match evaluate_request(
        &settings,
        today,
        payload.start_date,
        payload.end_date,
        payload.days,
        available,
    ) {
        Ok(days) => days,
        Err(rejection) => return Ok(reject(&rejection.message, rejection.needs_reset)),
    };

    // 7. overlap against open requests
    let open_requests = sqlx::query_as::<_, (u64, NaiveDate, NaiveDate)>(
        r#"
        SELECT id, start_date, end_date
        FROM leave_requests
        WHERE tenant_id = ? AND employee_id = ? AND status IN (?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(STATUS_PENDING)
    .bind(STATUS_APPROVED)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch open leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if open_requests
        .iter()
        .any(|(_, start, end)| ranges_overlap(payload.start_date, payload.end_date, *start, *end))
    {
        return Ok(reject(
            "The requested dates overlap an existing pending or approved leave request",
            false,
        ));
    }

    // 8. certificate only makes sense for sick leave
    if payload.medical_certificate_url.is_some() && payload.leave_type != LeaveType::Sick {
        return Ok(reject(
            "A medical certificate can only be attached to sick leave",
            false,
        ));
    }

    let insert = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (tenant_id, employee_id, leave_type, start_date, end_date, days, reason,
             medical_certificate_url, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(payload.leave_type.as_str())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days)
    .bind(payload.reason.trim())
    .bind(&payload.medical_certificate_url)
    .bind(STATUS_PENDING)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave_request = fetch_request(pool.get_ref(), auth.tenant_id, insert.last_insert_id())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to reload created leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // Best-effort heads-up to the manager; the request stands either way.
    notify_manager(&notifier, pool.get_ref(), auth.tenant_id, employee_id, &payload).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "leaveRequest": leave_request
    })))
}

async fn notify_manager(
    notifier: &Notifier,
    pool: &MySqlPool,
    tenant_id: u64,
    employee_id: u64,
    payload: &CreateLeave,
) {
    let manager = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT m.email, e.first_name, e.last_name
        FROM employees e
        JOIN employees m ON e.manager_id = m.id
        WHERE e.id = ? AND e.tenant_id = ?
        "#,
    )
    .bind(employee_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await;

    match manager {
        Ok(Some((manager_email, first_name, last_name))) => {
            notifier.send_best_effort(
                &manager_email,
                "New leave request awaiting review",
                &format!(
                    "{} {} requested {} leave from {} to {}.",
                    first_name,
                    last_name,
                    payload.leave_type.as_str(),
                    payload.start_date,
                    payload.end_date
                ),
            );
        }
        Ok(None) => {} // org root has no manager
        Err(e) => {
            tracing::warn!(error = %e, employee_id, "Manager lookup for notification failed");
        }
    }
}

/* =========================
List own leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/employee/leave",
    params(MyLeaveFilter),
    responses(
        (status = 200, description = "The session employee's leave requests", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MyLeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_or_forbidden()?;

    let mut where_sql =
        String::from(" WHERE tenant_id = ? AND employee_id = ?");
    let mut args: Vec<FilterValue> = vec![
        FilterValue::U64(auth.tenant_id),
        FilterValue::U64(employee_id),
    ];

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(year) = query.year {
        where_sql.push_str(" AND YEAR(start_date) = ?");
        args.push(FilterValue::I32(year));
    }

    let sql = format!(
        "SELECT {} FROM leave_requests{} ORDER BY created_at DESC",
        REQUEST_COLUMNS, where_sql
    );

    let mut q = sqlx::query_as::<_, LeaveRequest>(&sql);
    for arg in args {
        q = match arg {
            FilterValue::U64(v) => q.bind(v),
            FilterValue::I32(v) => q.bind(v),
            FilterValue::Str(s) => q.bind(s),
        };
    }

    let requests = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to fetch leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "requests": requests
    })))
}

/* =========================
Withdraw own pending request
========================= */
#[utoipa::path(
    put,
    path = "/api/employee/leave/{leave_id}/withdraw",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to withdraw")
    ),
    responses(
        (status = 200, description = "Leave request withdrawn"),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id_or_forbidden()?;
    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ? AND tenant_id = ? AND employee_id = ? AND status = ?
        "#,
    )
    .bind(STATUS_WITHDRAWN)
    .bind(leave_id)
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(STATUS_PENDING)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Withdraw leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(reject("Leave request not found or already processed", false));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Leave request withdrawn"
    })))
}

/// Managers may act only on their own reports; HR and admin on anyone in the
/// tenant.
async fn authorize_reviewer(
    auth: &AuthUser,
    pool: &MySqlPool,
    target_employee_id: u64,
) -> actix_web::Result<()> {
    match auth.role {
        Role::Admin | Role::Hr => Ok(()),
        Role::Manager => {
            let manager_id = sqlx::query_scalar::<_, Option<u64>>(
                "SELECT manager_id FROM employees WHERE id = ? AND tenant_id = ?",
            )
            .bind(target_employee_id)
            .bind(auth.tenant_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, target_employee_id, "Manager check failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?
            .flatten();

            if manager_id.is_some() && manager_id == auth.employee_id {
                Ok(())
            } else {
                Err(actix_web::error::ErrorForbidden(
                    "Managers may only review their own reports",
                ))
            }
        }
        Role::Employee => Err(actix_web::error::ErrorForbidden("HR/Admin/Manager only")),
    }
}

/* =========================
Approve leave (manager chain / HR / Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and balance charged", body = Object, example = json!({
            "success": true,
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let request = fetch_request(pool.get_ref(), auth.tenant_id, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Leave request not found"
            })));
        }
    };

    authorize_reviewer(&auth, pool.get_ref(), request.employee_id).await?;

    if request.status != STATUS_PENDING {
        return Ok(reject("Leave request not found or already processed", false));
    }

    let settings = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let leave_type = request
        .leave_type
        .parse::<LeaveType>()
        .map_err(|_| actix_web::error::ErrorInternalServerError("Corrupt leave type"))?;
    let leave_year = request.start_date.year();
    let org_default = settings.policy_days(leave_type);

    // Status flip and balance charge stand or fall together.
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let flipped = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ? AND tenant_id = ? AND status = ?
        "#,
    )
    .bind(STATUS_APPROVED)
    .bind(leave_id)
    .bind(auth.tenant_id)
    .bind(STATUS_PENDING)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Approve leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if flipped.rows_affected() == 0 {
        // Lost the race against another reviewer.
        return Ok(reject("Leave request not found or already processed", false));
    }

    // Lazily create the balance row from the org default, then charge it.
    sqlx::query(
        r#"
        INSERT INTO leave_balances (tenant_id, employee_id, leave_type, year, balance)
        VALUES (?, ?, ?, ?, ? - ?)
        ON DUPLICATE KEY UPDATE balance = balance - ?
        "#,
    )
    .bind(auth.tenant_id)
    .bind(request.employee_id)
    .bind(leave_type.as_str())
    .bind(leave_year)
    .bind(org_default)
    .bind(request.days)
    .bind(request.days)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Balance charge failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Approve commit failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    audit::record(
        pool.get_ref(),
        auth.tenant_id,
        auth.user_id,
        "leave.approve",
        "leave_request",
        Some(leave_id),
        serde_json::json!({ "days": request.days, "leaveType": request.leave_type }),
    )
    .await;

    notify_employee(
        &notifier,
        pool.get_ref(),
        auth.tenant_id,
        request.employee_id,
        "Leave request approved",
        &format!(
            "Your {} leave from {} to {} was approved.",
            request.leave_type, request.start_date, request.end_date
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (manager chain / HR / Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "success": true,
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let request = fetch_request(pool.get_ref(), auth.tenant_id, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let request = match request {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Leave request not found"
            })));
        }
    };

    authorize_reviewer(&auth, pool.get_ref(), request.employee_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?
        WHERE id = ? AND tenant_id = ? AND status = ?
        "#,
    )
    .bind(STATUS_REJECTED)
    .bind(leave_id)
    .bind(auth.tenant_id)
    .bind(STATUS_PENDING)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(reject("Leave request not found or already processed", false));
    }

    audit::record(
        pool.get_ref(),
        auth.tenant_id,
        auth.user_id,
        "leave.reject",
        "leave_request",
        Some(leave_id),
        serde_json::json!({ "leaveType": request.leave_type }),
    )
    .await;

    notify_employee(
        &notifier,
        pool.get_ref(),
        auth.tenant_id,
        request.employee_id,
        "Leave request rejected",
        &format!(
            "Your {} leave from {} to {} was rejected.",
            request.leave_type, request.start_date, request.end_date
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Leave rejected"
    })))
}

async fn notify_employee(
    notifier: &Notifier,
    pool: &MySqlPool,
    tenant_id: u64,
    employee_id: u64,
    subject: &str,
    body: &str,
) {
    let email = sqlx::query_scalar::<_, String>(
        "SELECT email FROM employees WHERE id = ? AND tenant_id = ?",
    )
    .bind(employee_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await;

    match email {
        Ok(Some(email)) => notifier.send_best_effort(&email, subject, body),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, employee_id, "Employee lookup for notification failed");
        }
    }
}

/* =========================
Leave detail
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = fetch_request(pool.get_ref(), auth.tenant_id, leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let leave = match leave {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "Leave request not found"
            })));
        }
    };

    // Employees see only their own requests.
    if auth.role == Role::Employee && auth.employee_id != Some(leave.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your leave request"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "leaveRequest": leave
    })))
}

/* =========================
Tenant-wide list (HR / Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE tenant_id = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::U64(auth.tenant_id)];

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::I32(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "SELECT {} FROM leave_requests{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        REQUEST_COLUMNS, where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::I32(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}
