use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;

use crate::model::tenant_settings::TenantSettings;

const SETTINGS_COLUMNS: &str = "tenant_id, leave_policies, carry_forward_leave, \
    max_carry_forward_days, minimum_leave_notice_days, maximum_consecutive_leave_days, \
    allow_half_day_leave, auto_allocate_leave, leave_allocation_day";

/// Tenant settings are read by every leave operation, so they sit in a small
/// moka cache in front of the database. Constructed once in `main` and passed
/// around through `web::Data` — no module-level static.
pub struct SettingsCache {
    cache: Cache<u64, Arc<TenantSettings>>,
}

impl SettingsCache {
    pub fn new() -> Self {
        SettingsCache {
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(300)) // 5 min TTL
                .build(),
        }
    }

    /// Settings for a tenant. Tenants without a stored row get in-memory org
    /// defaults; those are cached too but never persisted.
    pub async fn get(&self, pool: &MySqlPool, tenant_id: u64) -> Result<Arc<TenantSettings>> {
        if let Some(hit) = self.cache.get(&tenant_id).await {
            return Ok(hit);
        }

        let row = sqlx::query_as::<_, TenantSettings>(&format!(
            "SELECT {} FROM tenant_settings WHERE tenant_id = ?",
            SETTINGS_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        let settings = Arc::new(row.unwrap_or_else(|| TenantSettings::org_defaults(tenant_id)));
        self.cache.insert(tenant_id, settings.clone()).await;
        Ok(settings)
    }

    /// Drop the cached entry after a settings write.
    pub async fn invalidate(&self, tenant_id: u64) {
        self.cache.invalidate(&tenant_id).await;
    }

    async fn put(&self, settings: TenantSettings) {
        self.cache
            .insert(settings.tenant_id, Arc::new(settings))
            .await;
    }
}

/// Preload every tenant's settings at boot so first requests skip the
/// database round-trip.
pub async fn warmup_settings_cache(cache: &SettingsCache, pool: &MySqlPool) -> Result<()> {
    let query = format!("SELECT {} FROM tenant_settings", SETTINGS_COLUMNS);
    let mut stream = sqlx::query_as::<_, TenantSettings>(&query).fetch(pool);

    let mut total = 0usize;
    while let Some(row) = stream.next().await {
        let settings = row?;
        cache.put(settings).await;
        total += 1;
    }

    log::info!("Tenant settings cache warmup complete: {} tenants", total);

    Ok(())
}
