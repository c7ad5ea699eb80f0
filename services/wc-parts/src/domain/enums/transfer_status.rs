//! 调拨申请状态枚举

use serde::{Deserialize, Serialize};

/// 调拨申请状态
///
/// 主路径 PendingApproval → Approved → Shipped → Received；
/// PendingApproval → Rejected；发运前任意状态 → Cancelled。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// 待审批
    PendingApproval,
    /// 已审批
    Approved,
    /// 已发运
    Shipped,
    /// 已收货
    Received,
    /// 已驳回
    Rejected,
    /// 已取消
    Cancelled,
}

impl TransferStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Received | TransferStatus::Rejected | TransferStatus::Cancelled
        )
    }

    /// 是否允许取消（仅发运前）
    pub fn can_cancel(&self) -> bool {
        matches!(self, TransferStatus::PendingApproval | TransferStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::PendingApproval => "PENDING_APPROVAL",
            TransferStatus::Approved => "APPROVED",
            TransferStatus::Shipped => "SHIPPED",
            TransferStatus::Received => "RECEIVED",
            TransferStatus::Rejected => "REJECTED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_APPROVAL" => Some(TransferStatus::PendingApproval),
            "APPROVED" => Some(TransferStatus::Approved),
            "SHIPPED" => Some(TransferStatus::Shipped),
            "RECEIVED" => Some(TransferStatus::Received),
            "REJECTED" => Some(TransferStatus::Rejected),
            "CANCELLED" => Some(TransferStatus::Cancelled),
            _ => None,
        }
    }
}
