//! 通用重试机制模块
//!
//! 事务性存储在检测到串行化冲突时会中止当前工作单元，
//! 调用方需要在冲突后重试一次（见各 handler 的写路径）。

use std::future::Future;

use tracing::warn;

/// 对可重试的失败重试一次
///
/// `should_retry` 判断错误是否为可重试类别（如数据库串行化冲突）。
/// 第一次失败且可重试时再执行一次操作，第二次的结果原样返回。
pub async fn retry_once<T, E, F, Fut>(mut operation: F, should_retry: impl Fn(&E) -> bool) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match operation().await {
        Err(e) if should_retry(&e) => {
            warn!(error = %e, "Retrying operation after retryable failure");
            operation().await
        }
        other => other,
    }
}
