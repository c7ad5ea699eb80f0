//! 预留命令

use common::UserId;
use errors::{AppError, AppResult};

use crate::domain::value_objects::{CaseLineId, ReservationId, Vin, WarehouseId};

/// 为工单行预留配件
#[derive(Debug, Clone)]
pub struct ReservePartsCommand {
    pub user_id: UserId,
    pub case_line_id: CaseLineId,
    /// 服务中心本地仓
    pub warehouse_id: WarehouseId,
}

/// 领料命令
#[derive(Debug, Clone)]
pub struct PickReservationCommand {
    pub user_id: UserId,
    pub reservation_id: ReservationId,
}

/// 装车核销命令
#[derive(Debug, Clone)]
pub struct InstallReservationCommand {
    pub user_id: UserId,
    pub reservation_id: ReservationId,
    pub vin: Vin,
}

/// 取消预留命令
#[derive(Debug, Clone)]
pub struct CancelReservationCommand {
    pub user_id: UserId,
    pub reservation_id: ReservationId,
    pub reason: String,
}

impl CancelReservationCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.reason.trim().is_empty() {
            return Err(AppError::validation("取消原因不能为空"));
        }
        Ok(())
    }
}
