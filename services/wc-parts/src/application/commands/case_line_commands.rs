//! 保修工单/工单行命令

use common::UserId;
use errors::{AppError, AppResult};

use crate::domain::enums::WarrantyStatus;
use crate::domain::value_objects::{CaseLineId, GuaranteeCaseId, TypeComponentId, Vin};

/// 开单命令
#[derive(Debug, Clone)]
pub struct OpenCaseCommand {
    pub user_id: UserId,
    pub vin: Vin,
}

/// 新增工单行（故障诊断记录）
#[derive(Debug, Clone)]
pub struct CreateCaseLineCommand {
    pub user_id: UserId,
    pub guarantee_case_id: GuaranteeCaseId,
    pub diagnosis_text: String,
    /// 诊断若判定需要换件则填写件型与数量
    pub type_component_id: Option<TypeComponentId>,
    pub quantity_needed: i64,
}

impl CreateCaseLineCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.diagnosis_text.trim().is_empty() {
            return Err(AppError::validation("诊断描述不能为空"));
        }
        if self.type_component_id.is_some() && self.quantity_needed <= 0 {
            return Err(AppError::invalid_quantity(format!(
                "quantity_needed must be positive, got {}",
                self.quantity_needed
            )));
        }
        Ok(())
    }
}

/// 保修状态裁定命令
#[derive(Debug, Clone)]
pub struct SetWarrantyStatusCommand {
    pub user_id: UserId,
    pub case_line_id: CaseLineId,
    pub warranty_status: WarrantyStatus,
}

impl SetWarrantyStatusCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.warranty_status == WarrantyStatus::PendingApproval {
            return Err(AppError::validation("裁定结果只能是 eligible 或 ineligible"));
        }
        Ok(())
    }
}

/// 完工命令
#[derive(Debug, Clone)]
pub struct CompleteCaseLineCommand {
    pub user_id: UserId,
    pub case_line_id: CaseLineId,
    pub correction_text: String,
}

/// 取消工单行命令
#[derive(Debug, Clone)]
pub struct CancelCaseLineCommand {
    pub user_id: UserId,
    pub case_line_id: CaseLineId,
    pub reason: String,
}

impl CancelCaseLineCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.reason.trim().is_empty() {
            return Err(AppError::validation("取消原因不能为空"));
        }
        Ok(())
    }
}
