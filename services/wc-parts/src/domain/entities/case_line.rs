//! 工单行与保修工单

use common::{AuditInfo, UserId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::{CaseLineStatus, GuaranteeCaseStatus, WarrantyStatus};
use crate::domain::value_objects::{CaseLineId, GuaranteeCaseId, TypeComponentId, Vin};

/// 工单行
///
/// 一次保修来访中诊断出的一个问题及其修复动作。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseLine {
    id: CaseLineId,
    guarantee_case_id: GuaranteeCaseId,
    diagnosis_text: String,
    correction_text: String,
    /// 修复所需配件类型（纯工时修复为 None）
    type_component_id: Option<TypeComponentId>,
    quantity_needed: i64,
    warranty_status: WarrantyStatus,
    status: CaseLineStatus,
    technician_id: UserId,
    audit_info: AuditInfo,
}

impl CaseLine {
    /// 技师诊断时创建工单行
    pub fn new(
        guarantee_case_id: GuaranteeCaseId,
        technician_id: UserId,
        diagnosis_text: impl Into<String>,
        type_component_id: Option<TypeComponentId>,
        quantity_needed: i64,
    ) -> AppResult<Self> {
        let diagnosis_text = diagnosis_text.into();
        if diagnosis_text.trim().is_empty() {
            return Err(AppError::validation("诊断描述不能为空"));
        }
        if type_component_id.is_some() && quantity_needed <= 0 {
            return Err(AppError::invalid_quantity(format!(
                "quantity must be positive, got {}",
                quantity_needed
            )));
        }
        Ok(Self {
            id: CaseLineId::new(),
            guarantee_case_id,
            diagnosis_text,
            correction_text: String::new(),
            type_component_id,
            quantity_needed,
            warranty_status: WarrantyStatus::PendingApproval,
            status: CaseLineStatus::PendingApproval,
            technician_id,
            audit_info: AuditInfo::default(),
        })
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CaseLineId,
        guarantee_case_id: GuaranteeCaseId,
        diagnosis_text: String,
        correction_text: String,
        type_component_id: Option<TypeComponentId>,
        quantity_needed: i64,
        warranty_status: WarrantyStatus,
        status: CaseLineStatus,
        technician_id: UserId,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            guarantee_case_id,
            diagnosis_text,
            correction_text,
            type_component_id,
            quantity_needed,
            warranty_status,
            status,
            technician_id,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn guarantee_case_id(&self) -> GuaranteeCaseId {
        self.guarantee_case_id
    }

    pub fn diagnosis_text(&self) -> &str {
        &self.diagnosis_text
    }

    pub fn correction_text(&self) -> &str {
        &self.correction_text
    }

    pub fn type_component_id(&self) -> Option<TypeComponentId> {
        self.type_component_id
    }

    pub fn quantity_needed(&self) -> i64 {
        self.quantity_needed
    }

    pub fn warranty_status(&self) -> WarrantyStatus {
        self.warranty_status
    }

    pub fn status(&self) -> CaseLineStatus {
        self.status
    }

    pub fn technician_id(&self) -> &UserId {
        &self.technician_id
    }

    // ========== 保修资格（与生命周期正交） ==========

    /// 判定在保：PENDING_APPROVAL → ELIGIBLE
    pub fn approve_warranty(&mut self) -> AppResult<()> {
        if self.warranty_status != WarrantyStatus::PendingApproval {
            return Err(AppError::invalid_transition(
                "case line warranty",
                self.warranty_status.as_str(),
                "approve",
            ));
        }
        self.warranty_status = WarrantyStatus::Eligible;
        Ok(())
    }

    /// 判定不在保：PENDING_APPROVAL → INELIGIBLE
    pub fn reject_warranty(&mut self) -> AppResult<()> {
        if self.warranty_status != WarrantyStatus::PendingApproval {
            return Err(AppError::invalid_transition(
                "case line warranty",
                self.warranty_status.as_str(),
                "reject",
            ));
        }
        self.warranty_status = WarrantyStatus::Ineligible;
        Ok(())
    }

    // ========== 生命周期转换 ==========

    /// 配件不足，转入等待配件
    pub fn mark_waiting_for_parts(&mut self) -> AppResult<()> {
        match self.status {
            CaseLineStatus::PendingApproval | CaseLineStatus::InProgress | CaseLineStatus::WaitingForParts => {
                self.status = CaseLineStatus::WaitingForParts;
                Ok(())
            }
            _ => Err(AppError::invalid_transition(
                "case line",
                self.status.as_str(),
                "wait for parts",
            )),
        }
    }

    /// 配件就绪或纯工时修复开工
    pub fn start_progress(&mut self) -> AppResult<()> {
        match self.status {
            CaseLineStatus::PendingApproval
            | CaseLineStatus::WaitingForParts
            | CaseLineStatus::InProgress => {
                self.status = CaseLineStatus::InProgress;
                Ok(())
            }
            _ => Err(AppError::invalid_transition(
                "case line",
                self.status.as_str(),
                "start",
            )),
        }
    }

    /// 完工：仅允许从维修中完成，并记录修复说明
    pub fn complete(&mut self, correction_text: impl Into<String>) -> AppResult<()> {
        if self.status != CaseLineStatus::InProgress {
            return Err(AppError::invalid_transition(
                "case line",
                self.status.as_str(),
                "complete",
            ));
        }
        self.correction_text = correction_text.into();
        self.status = CaseLineStatus::Completed;
        Ok(())
    }

    /// 取消：任何非终态可达
    pub fn cancel(&mut self) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::invalid_transition(
                "case line",
                self.status.as_str(),
                "cancel",
            ));
        }
        self.status = CaseLineStatus::Cancelled;
        Ok(())
    }
}

impl Entity for CaseLine {
    type Id = CaseLineId;

    fn id(&self) -> &CaseLineId {
        &self.id
    }
}

impl AggregateRoot for CaseLine {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

/// 保修工单
///
/// 把一次车辆来访的所有工单行聚在一起，状态由工单行推导。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuaranteeCase {
    id: GuaranteeCaseId,
    vin: Vin,
    status: GuaranteeCaseStatus,
    audit_info: AuditInfo,
}

impl GuaranteeCase {
    /// 车辆接车时开单
    pub fn open(vin: Vin) -> Self {
        Self {
            id: GuaranteeCaseId::new(),
            vin,
            status: GuaranteeCaseStatus::PendingAssignment,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: GuaranteeCaseId,
        vin: Vin,
        status: GuaranteeCaseStatus,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            vin,
            status,
            audit_info,
        }
    }

    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    pub fn status(&self) -> GuaranteeCaseStatus {
        self.status
    }

    /// 诊断开始（首次指派诊断任务时）
    pub fn start_diagnosis(&mut self) {
        if self.status == GuaranteeCaseStatus::PendingAssignment {
            self.status = GuaranteeCaseStatus::InDiagnosis;
        }
    }

    /// 按工单行状态重算工单状态
    ///
    /// 所有工单行都离开待审批后工单才算诊断完成。
    pub fn refresh_from_lines(&mut self, lines: &[CaseLine]) {
        if self.status == GuaranteeCaseStatus::PendingAssignment {
            return;
        }
        if !lines.is_empty() && lines.iter().all(|l| l.status().left_pending()) {
            self.status = GuaranteeCaseStatus::Diagnosed;
        } else {
            self.status = GuaranteeCaseStatus::InDiagnosis;
        }
    }
}

impl Entity for GuaranteeCase {
    type Id = GuaranteeCaseId;

    fn id(&self) -> &GuaranteeCaseId {
        &self.id
    }
}

impl AggregateRoot for GuaranteeCase {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
