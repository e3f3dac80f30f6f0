use sqlx::MySqlPool;

/// Best-effort audit trail for admin mutations. A failed insert is logged and
/// swallowed; the triggering operation already succeeded.
pub async fn record(
    pool: &MySqlPool,
    tenant_id: u64,
    user_id: u64,
    action: &str,
    entity: &str,
    entity_id: Option<u64>,
    detail: serde_json::Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs (tenant_id, user_id, action, entity, entity_id, detail)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tenant_id)
    .bind(user_id)
    .bind(action)
    .bind(entity)
    .bind(entity_id)
    .bind(detail)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, action, entity, "Failed to write audit log");
    }
}
