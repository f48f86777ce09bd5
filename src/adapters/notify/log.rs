use async_trait::async_trait;

use crate::domain::UserId;
use crate::ports::Notifier;

/// Default sink: events go to the tracing output only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user: &UserId, message: &str) {
        tracing::info!(user = %user, "{}", message);
    }
}
