use filehub_core::{ClientError, LogLevel};

/// Receives every failure the gateway produces, before it is returned.
pub trait FailureNotifier: Send + Sync {
    fn notify(&self, operation: &str, error: &ClientError);
}

/// Default notifier: one `tracing` event per failure at the error's level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl FailureNotifier for TracingNotifier {
    fn notify(&self, operation: &str, error: &ClientError) {
        let status = error.status();
        match error.log_level() {
            LogLevel::Debug => {
                tracing::debug!(operation, ?status, error = %error, "Request failed")
            }
            LogLevel::Warn => tracing::warn!(operation, ?status, error = %error, "Request failed"),
            LogLevel::Error => {
                tracing::error!(operation, ?status, error = %error, "Request failed")
            }
        }
    }
}
