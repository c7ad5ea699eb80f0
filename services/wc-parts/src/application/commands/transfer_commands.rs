//! 调拨命令

use common::UserId;
use errors::{AppError, AppResult};

use crate::domain::value_objects::{CaseLineId, TransferRequestId, TypeComponentId, WarehouseId};

/// 调拨请求明细
#[derive(Debug, Clone)]
pub struct TransferItemInput {
    pub type_component_id: TypeComponentId,
    pub quantity: i64,
    /// 缺料触发时回指工单行，到货后自动续接预留
    pub case_line_id: Option<CaseLineId>,
}

/// 创建调拨请求
#[derive(Debug, Clone)]
pub struct CreateTransferCommand {
    pub user_id: UserId,
    /// 请求方仓库（收货仓）
    pub requesting_warehouse_id: WarehouseId,
    pub items: Vec<TransferItemInput>,
}

impl CreateTransferCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.items.is_empty() {
            return Err(AppError::validation("调拨请求必须包含至少一条明细"));
        }
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(AppError::invalid_quantity(format!(
                    "transfer quantity must be positive, got {}",
                    item.quantity
                )));
            }
        }
        Ok(())
    }
}

/// 审批通过
#[derive(Debug, Clone)]
pub struct ApproveTransferCommand {
    pub user_id: UserId,
    pub transfer_request_id: TransferRequestId,
}

/// 审批驳回（必须附理由）
#[derive(Debug, Clone)]
pub struct RejectTransferCommand {
    pub user_id: UserId,
    pub transfer_request_id: TransferRequestId,
    pub reason: String,
}

/// 发运
#[derive(Debug, Clone)]
pub struct ShipTransferCommand {
    pub user_id: UserId,
    pub transfer_request_id: TransferRequestId,
}

/// 收货
#[derive(Debug, Clone)]
pub struct ReceiveTransferCommand {
    pub user_id: UserId,
    pub transfer_request_id: TransferRequestId,
}

/// 取消（发运前）
#[derive(Debug, Clone)]
pub struct CancelTransferCommand {
    pub user_id: UserId,
    pub transfer_request_id: TransferRequestId,
    pub reason: String,
}
