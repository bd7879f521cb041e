//! Admin dashboard aggregates.

use serde::Serialize;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub total_partners: i64,
    pub total_admins: i64,
    pub completed_onboards: i64,
    /// Sum of uploaded file sizes in bytes, across all submissions.
    pub total_file_size_bytes: i64,
}
