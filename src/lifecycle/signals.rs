//! OS signal handling.

/// Resolve on Ctrl+C. If the handler cannot be installed this never
/// resolves, so shutdown falls back to the explicit trigger.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}
