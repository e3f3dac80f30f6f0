use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::tenant_settings::{LeavePolicies, TenantSettings};
use crate::utils::audit;
use crate::utils::settings_cache::SettingsCache;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    /// Replaces the whole policy map when present.
    #[schema(value_type = Object, nullable = true)]
    pub leave_policies: Option<LeavePolicies>,
    pub carry_forward_leave: Option<bool>,
    pub max_carry_forward_days: Option<i64>,
    pub minimum_leave_notice_days: Option<i64>,
    /// 0 clears the cap.
    #[schema(example = 15, nullable = true)]
    pub maximum_consecutive_leave_days: Option<i64>,
    pub allow_half_day_leave: Option<bool>,
    pub auto_allocate_leave: Option<bool>,
    #[schema(example = "01-01")]
    pub leave_allocation_day: Option<String>,
}

/* =========================
Read tenant settings
========================= */
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Tenant settings (org defaults when none stored)", body = TenantSettings),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let settings = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "settings": settings.as_ref()
    })))
}

/* =========================
Update tenant settings (Admin)
========================= */
/// Partial update: absent fields keep their stored (or default) values. The
/// settings cache entry is dropped afterwards so the next leave operation
/// sees the new policy.
#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = UpdateSettings,
    responses(
        (status = 200, description = "Updated settings", body = TenantSettings),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    settings_cache: web::Data<SettingsCache>,
    payload: web::Json<UpdateSettings>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Some(day) = payload.leave_allocation_day.as_deref() {
        if !valid_allocation_day(day) {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "leaveAllocationDay must be an MM-DD string"
            })));
        }
    }

    let current = settings_cache
        .get(pool.get_ref(), auth.tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load tenant settings");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let payload = payload.into_inner();
    let merged = TenantSettings {
        tenant_id: auth.tenant_id,
        leave_policies: payload
            .leave_policies
            .map(Json)
            .unwrap_or_else(|| current.leave_policies.clone()),
        carry_forward_leave: payload
            .carry_forward_leave
            .unwrap_or(current.carry_forward_leave),
        max_carry_forward_days: payload
            .max_carry_forward_days
            .unwrap_or(current.max_carry_forward_days),
        minimum_leave_notice_days: payload
            .minimum_leave_notice_days
            .unwrap_or(current.minimum_leave_notice_days),
        maximum_consecutive_leave_days: match payload.maximum_consecutive_leave_days {
            Some(0) => None, // 0 clears the cap
            Some(cap) => Some(cap),
            None => current.maximum_consecutive_leave_days,
        },
        allow_half_day_leave: payload
            .allow_half_day_leave
            .unwrap_or(current.allow_half_day_leave),
        auto_allocate_leave: payload
            .auto_allocate_leave
            .unwrap_or(current.auto_allocate_leave),
        leave_allocation_day: payload
            .leave_allocation_day
            .unwrap_or_else(|| current.leave_allocation_day.clone()),
    };

    sqlx::query(
        r#"
        INSERT INTO tenant_settings
            (tenant_id, leave_policies, carry_forward_leave, max_carry_forward_days,
             minimum_leave_notice_days, maximum_consecutive_leave_days,
             allow_half_day_leave, auto_allocate_leave, leave_allocation_day)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            leave_policies = VALUES(leave_policies),
            carry_forward_leave = VALUES(carry_forward_leave),
            max_carry_forward_days = VALUES(max_carry_forward_days),
            minimum_leave_notice_days = VALUES(minimum_leave_notice_days),
            maximum_consecutive_leave_days = VALUES(maximum_consecutive_leave_days),
            allow_half_day_leave = VALUES(allow_half_day_leave),
            auto_allocate_leave = VALUES(auto_allocate_leave),
            leave_allocation_day = VALUES(leave_allocation_day)
        "#,
    )
    .bind(merged.tenant_id)
    .bind(&merged.leave_policies)
    .bind(merged.carry_forward_leave)
    .bind(merged.max_carry_forward_days)
    .bind(merged.minimum_leave_notice_days)
    .bind(merged.maximum_consecutive_leave_days)
    .bind(merged.allow_half_day_leave)
    .bind(merged.auto_allocate_leave)
    .bind(&merged.leave_allocation_day)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to write tenant settings");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    settings_cache.invalidate(auth.tenant_id).await;

    audit::record(
        pool.get_ref(),
        auth.tenant_id,
        auth.user_id,
        "settings.update",
        "tenant_settings",
        None,
        serde_json::json!({}),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "settings": merged
    })))
}

fn valid_allocation_day(day: &str) -> bool {
    let Some((month, dom)) = day.split_once('-') else {
        return false;
    };
    let (Ok(month), Ok(dom)) = (month.parse::<u32>(), dom.parse::<u32>()) else {
        return false;
    };
    (1..=12).contains(&month) && (1..=31).contains(&dom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_day_format() {
        assert!(valid_allocation_day("01-01"));
        assert!(valid_allocation_day("12-31"));
        assert!(!valid_allocation_day("13-01"));
        assert!(!valid_allocation_day("06-40"));
        assert!(!valid_allocation_day("June 1"));
    }
}
