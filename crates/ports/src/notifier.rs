//! 通知派发 trait 定义
//!
//! fire-and-forget：派发失败由调用方记录日志，不影响业务事务。

use async_trait::async_trait;
use common::UserId;
use errors::AppResult;

/// 通知派发者 trait
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// 向一组接收者派发一条已序列化的事件负载
    ///
    /// `topic` 标识事件种类（如 "transfer.approved"）。
    async fn dispatch(
        &self,
        topic: &str,
        recipients: &[UserId],
        payload: serde_json::Value,
    ) -> AppResult<()>;
}
