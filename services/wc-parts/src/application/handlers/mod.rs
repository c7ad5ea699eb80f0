//! 业务处理器

pub mod assignment_handler;
pub mod case_line_handler;
pub mod inventory_handler;
pub mod reservation_handler;
pub mod transfer_handler;

pub use assignment_handler::AssignmentHandler;
pub use case_line_handler::CaseLineHandler;
pub use inventory_handler::InventoryHandler;
pub use reservation_handler::{ReservationHandler, ReserveOutcome};
pub use transfer_handler::TransferHandler;

use common::UserId;
use errors::{AppError, AppResult};
use ports::NotificationDispatcher;
use tracing::{error, warn};

use crate::domain::events::PartsEvent;

/// 台账不变量被破坏说明数据已受损，单独以 error 级别暴露给运维。
pub(crate) fn trace_invariant<T>(result: AppResult<T>) -> AppResult<T> {
    if let Err(AppError::InvariantViolation(msg)) = &result {
        error!("Ledger invariant violated: {}", msg);
    }
    result
}

/// 发送领域事件通知。通知失败只记日志，不影响已提交的事务。
pub(crate) async fn notify(
    dispatcher: &dyn NotificationDispatcher,
    event: &PartsEvent,
    recipients: &[UserId],
) {
    let topic = event.topic();
    let payload = match serde_json::to_value(event) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to serialize event for topic {}: {}", topic, e);
            return;
        }
    };
    if let Err(e) = dispatcher.dispatch(topic, recipients, payload).await {
        warn!("Failed to dispatch notification on topic {}: {}", topic, e);
    }
}
