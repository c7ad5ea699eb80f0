//! 通知派发实现

use async_trait::async_trait;
use common::UserId;
use errors::AppResult;
use ports::NotificationDispatcher;
use tracing::info;

/// 把通知写进结构化日志的派发器。
/// 接入站内信/消息总线前的默认实现，也是测试环境的默认选择。
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn dispatch(
        &self,
        topic: &str,
        recipients: &[UserId],
        payload: serde_json::Value,
    ) -> AppResult<()> {
        info!(
            topic = topic,
            recipients = recipients.len(),
            payload = %payload,
            "Domain notification dispatched"
        );
        Ok(())
    }
}
