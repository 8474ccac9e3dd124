//! Periodic cleanup of expired revocation entries.
//!
//! A revoked token is only worth remembering until its own expiry: after that
//! the signature check rejects it regardless. This job drops those entries on
//! a fixed interval so the store does not grow without bound.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use keygate_db::stores::RevocationStore;
use tokio_util::sync::CancellationToken;

/// Run the prune loop until `cancel` is triggered.
///
/// The first tick fires immediately, so entries left over from a previous run
/// are cleared at startup.
pub async fn run(store: Arc<dyn RevocationStore>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Revocation prune job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Revocation prune job stopping");
                break;
            }
            _ = interval.tick() => {
                match store.prune_expired(Utc::now()).await {
                    Ok(0) => tracing::debug!("Revocation prune: nothing expired"),
                    Ok(deleted) => tracing::info!(deleted, "Revocation prune: dropped expired entries"),
                    Err(e) => tracing::error!(error = %e, "Revocation prune: cleanup failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use keygate_db::stores::InMemoryRevocationStore;

    use super::*;

    #[tokio::test]
    async fn first_tick_prunes_expired_and_cancel_stops_the_loop() {
        let store = Arc::new(InMemoryRevocationStore::new());
        store
            .add("stale", Utc::now() - chrono::Duration::minutes(5))
            .await
            .unwrap();
        store
            .add("live", Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            store.clone(),
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        for _ in 0..100 {
            if store.entry_count().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert!(!store.contains("stale").await.unwrap());
        assert!(store.contains("live").await.unwrap());
    }
}
