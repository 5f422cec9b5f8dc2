/// Background jobs
///
/// - `JobTracker`: on-demand sync passes with pollable status
/// - `PriceSyncJob`: optional cron-scheduled sync pass
/// - Revocation cleanup: cron job pruning expired token revocations

pub mod job_tracker;
pub mod price_sync_job;
pub mod revocation_cleanup_job;

pub use job_tracker::{JobRecord, JobRetention, JobState, JobTracker};
pub use price_sync_job::{PriceSyncJob, DEFAULT_PRICE_SYNC_SCHEDULE};
pub use revocation_cleanup_job::create_revocation_cleanup_job;
