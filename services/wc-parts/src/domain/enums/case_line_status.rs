//! 工单行与保修工单状态枚举

use serde::{Deserialize, Serialize};

/// 工单行生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseLineStatus {
    /// 待审批
    PendingApproval,
    /// 等待配件
    WaitingForParts,
    /// 维修中
    InProgress,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl CaseLineStatus {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseLineStatus::Completed | CaseLineStatus::Cancelled)
    }

    /// 是否已离开待诊断审批阶段
    pub fn left_pending(&self) -> bool {
        !matches!(self, CaseLineStatus::PendingApproval)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseLineStatus::PendingApproval => "pending_approval",
            CaseLineStatus::WaitingForParts => "waiting_for_parts",
            CaseLineStatus::InProgress => "in_progress",
            CaseLineStatus::Completed => "completed",
            CaseLineStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_approval" => Some(CaseLineStatus::PendingApproval),
            "waiting_for_parts" => Some(CaseLineStatus::WaitingForParts),
            "in_progress" => Some(CaseLineStatus::InProgress),
            "completed" => Some(CaseLineStatus::Completed),
            "cancelled" => Some(CaseLineStatus::Cancelled),
            _ => None,
        }
    }
}

/// 保修资格状态
///
/// 与生命周期状态正交：Ineligible 的工单行永远不得预留库存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarrantyStatus {
    /// 待审批
    PendingApproval,
    /// 在保
    Eligible,
    /// 不在保
    Ineligible,
}

impl WarrantyStatus {
    /// 是否允许为该工单行预留库存
    pub fn allows_reservation(&self) -> bool {
        matches!(self, WarrantyStatus::Eligible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarrantyStatus::PendingApproval => "PENDING_APPROVAL",
            WarrantyStatus::Eligible => "ELIGIBLE",
            WarrantyStatus::Ineligible => "INELIGIBLE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_APPROVAL" => Some(WarrantyStatus::PendingApproval),
            "ELIGIBLE" => Some(WarrantyStatus::Eligible),
            "INELIGIBLE" => Some(WarrantyStatus::Ineligible),
            _ => None,
        }
    }
}

/// 保修工单状态（粗于工单行状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuaranteeCaseStatus {
    /// 待指派
    PendingAssignment,
    /// 诊断中
    InDiagnosis,
    /// 诊断完成（所有工单行已离开待审批）
    Diagnosed,
}

impl GuaranteeCaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuaranteeCaseStatus::PendingAssignment => "PENDING_ASSIGNMENT",
            GuaranteeCaseStatus::InDiagnosis => "IN_DIAGNOSIS",
            GuaranteeCaseStatus::Diagnosed => "DIAGNOSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_ASSIGNMENT" => Some(GuaranteeCaseStatus::PendingAssignment),
            "IN_DIAGNOSIS" => Some(GuaranteeCaseStatus::InDiagnosis),
            "DIAGNOSED" => Some(GuaranteeCaseStatus::Diagnosed),
            _ => None,
        }
    }
}
