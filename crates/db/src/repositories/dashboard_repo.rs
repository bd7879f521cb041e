//! Aggregate queries behind the admin dashboard.

use sqlx::PgPool;

use crate::models::dashboard::DashboardMetrics;

pub struct DashboardRepo;

impl DashboardRepo {
    /// Compute the dashboard headline numbers.
    pub async fn metrics(pool: &PgPool) -> Result<DashboardMetrics, sqlx::Error> {
        let total_partners: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'partner'")
                .fetch_one(pool)
                .await?;
        let total_admins: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role IN ('admin', 'superadmin')",
        )
        .fetch_one(pool)
        .await?;
        let completed_onboards: Option<i64> =
            sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE status = 'approved'")
                .fetch_one(pool)
                .await?;
        // Sizes live inside the JSONB file entries; older entries may lack one.
        let total_file_size_bytes: Option<i64> = sqlx::query_scalar(
            "SELECT COALESCE(SUM((f->>'size')::BIGINT), 0)::BIGINT \
             FROM submissions, jsonb_array_elements(files) AS f \
             WHERE f ? 'size'",
        )
        .fetch_one(pool)
        .await?;

        Ok(DashboardMetrics {
            total_partners: total_partners.unwrap_or(0),
            total_admins: total_admins.unwrap_or(0),
            completed_onboards: completed_onboards.unwrap_or(0),
            total_file_size_bytes: total_file_size_bytes.unwrap_or(0),
        })
    }
}
