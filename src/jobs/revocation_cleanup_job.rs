use tokio_cron_scheduler::{Job, JobScheduler};

use crate::auth::TokenAuthority;

/// Create a job that drops expired entries from the token revocation set
///
/// Runs every minute (cron: "0 * * * * *"). `verify` already prunes the entries
/// it touches; this catches revoked tokens that are never presented again.
pub async fn create_revocation_cleanup_job(
    authority: TokenAuthority,
    scheduler: &JobScheduler,
) -> Result<(), Box<dyn std::error::Error>> {
    let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let authority = authority.clone();

        Box::pin(async move {
            let removed = authority.prune_expired();
            if removed > 0 {
                tracing::debug!(
                    "🧹 Pruned {} expired revocations ({} remaining)",
                    removed,
                    authority.revoked_count()
                );
            }
        })
    })?;

    scheduler.add(job).await?;

    tracing::info!("✅ Revocation cleanup job registered");
    tracing::info!("   Schedule: Every minute");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_job_registration() {
        let authority = TokenAuthority::new(
            "a-test-secret-that-is-long-enough-1234",
            Duration::from_secs(60),
        )
        .unwrap();
        let scheduler = JobScheduler::new().await.unwrap();

        assert!(create_revocation_cleanup_job(authority, &scheduler).await.is_ok());
    }
}
