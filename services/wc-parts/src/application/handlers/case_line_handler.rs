//! 保修工单与工单行处理器
//!
//! 开单、诊断建行、保修裁定、完工与取消；工单头状态由行状态汇总刷新。

use std::sync::Arc;

use common::retry::retry_once;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use ports::NotificationDispatcher;
use tracing::info;

use crate::domain::entities::{CaseLine, GuaranteeCase};
use crate::domain::enums::WarrantyStatus;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::GuaranteeCaseId;

use crate::application::commands::*;

pub struct CaseLineHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    #[allow(dead_code)]
    notifier: Arc<dyn NotificationDispatcher>,
}

impl CaseLineHandler {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            uow_factory,
            notifier,
        }
    }

    // ========== 开单 / 建行 ==========

    /// 按 VIN 开保修工单
    pub async fn open_case(&self, cmd: OpenCaseCommand) -> AppResult<GuaranteeCase> {
        let mut uow = self.uow_factory.begin().await?;

        let mut case = GuaranteeCase::open(cmd.vin.clone());
        case.audit_info_mut().created_by = Some(cmd.user_id);
        uow.save_guarantee_case(&case).await?;
        uow.commit().await?;

        info!("Guarantee case {} opened for VIN {}", case.id(), cmd.vin.as_str());
        Ok(case)
    }

    /// 技师录入诊断，生成工单行
    pub async fn create_case_line(&self, cmd: CreateCaseLineCommand) -> AppResult<CaseLine> {
        cmd.validate()?;
        let mut uow = self.uow_factory.begin().await?;

        let mut case = uow.get_guarantee_case(cmd.guarantee_case_id).await?;
        case.start_diagnosis();

        let mut case_line = CaseLine::new(
            cmd.guarantee_case_id,
            cmd.user_id,
            &cmd.diagnosis_text,
            cmd.type_component_id,
            cmd.quantity_needed,
        )?;
        case_line.audit_info_mut().created_by = Some(cmd.user_id);

        uow.save_case_line(&case_line).await?;
        uow.save_guarantee_case(&case).await?;
        uow.commit().await?;

        info!(
            "Case line {} created under case {}",
            case_line.id(),
            cmd.guarantee_case_id
        );
        Ok(case_line)
    }

    // ========== 保修裁定 ==========

    /// 裁定保修资格。在保且无换件需求直接开工；
    /// 不在保只改资格位，生命周期留在原地由客户付费流程接走。
    pub async fn set_warranty_status(&self, cmd: SetWarrantyStatusCommand) -> AppResult<CaseLine> {
        cmd.validate()?;
        retry_once(|| self.set_warranty_inner(&cmd), AppError::is_retryable).await
    }

    async fn set_warranty_inner(&self, cmd: &SetWarrantyStatusCommand) -> AppResult<CaseLine> {
        let mut uow = self.uow_factory.begin().await?;

        let mut case_line = uow.get_case_line(cmd.case_line_id).await?;
        match cmd.warranty_status {
            WarrantyStatus::Eligible => {
                case_line.approve_warranty()?;
                if case_line.type_component_id().is_none() {
                    case_line.start_progress()?;
                }
            }
            WarrantyStatus::Ineligible => case_line.reject_warranty()?,
            WarrantyStatus::PendingApproval => {
                return Err(AppError::validation("裁定结果只能是 eligible 或 ineligible"));
            }
        }
        case_line.audit_info_mut().update(Some(cmd.user_id));
        uow.save_case_line(&case_line).await?;

        self.refresh_case(uow.as_mut(), case_line.guarantee_case_id())
            .await?;
        uow.commit().await?;

        info!(
            "Case line {} warranty set to {}",
            cmd.case_line_id,
            cmd.warranty_status.as_str()
        );
        Ok(case_line)
    }

    // ========== 完工 / 取消 ==========

    /// 完工：填写修复描述，状态转入已完成
    pub async fn complete_case_line(&self, cmd: CompleteCaseLineCommand) -> AppResult<CaseLine> {
        retry_once(|| self.complete_inner(&cmd), AppError::is_retryable).await
    }

    async fn complete_inner(&self, cmd: &CompleteCaseLineCommand) -> AppResult<CaseLine> {
        let mut uow = self.uow_factory.begin().await?;

        let mut case_line = uow.get_case_line(cmd.case_line_id).await?;
        case_line.complete(&cmd.correction_text)?;
        case_line.audit_info_mut().update(Some(cmd.user_id));
        uow.save_case_line(&case_line).await?;
        uow.commit().await?;

        info!("Case line {} completed", cmd.case_line_id);
        Ok(case_line)
    }

    /// 取消工单行：名下未核销的预留一并取消并释放台账
    pub async fn cancel_case_line(&self, cmd: CancelCaseLineCommand) -> AppResult<CaseLine> {
        cmd.validate()?;
        super::trace_invariant(retry_once(|| self.cancel_inner(&cmd), AppError::is_retryable).await)
    }

    async fn cancel_inner(&self, cmd: &CancelCaseLineCommand) -> AppResult<CaseLine> {
        let mut uow = self.uow_factory.begin().await?;

        let mut case_line = uow.get_case_line(cmd.case_line_id).await?;
        case_line.cancel()?;
        case_line.audit_info_mut().update(Some(cmd.user_id));

        let reservations = uow.reservations_for_case_line(cmd.case_line_id).await?;
        for mut reservation in reservations {
            if !reservation.cancel(&cmd.reason)? {
                continue;
            }
            let mut line = uow
                .lock_stock_line(reservation.warehouse_id(), reservation.type_component_id())
                .await?;
            line.release(reservation.quantity())?;
            uow.save_stock_line(&line).await?;
            uow.save_reservation(&reservation).await?;

            let components = uow.components_for_reservation(*reservation.id()).await?;
            for mut component in components {
                component.release_to_warehouse(reservation.warehouse_id())?;
                uow.save_component(&component).await?;
            }
        }

        uow.save_case_line(&case_line).await?;
        uow.commit().await?;

        info!("Case line {} cancelled: {}", cmd.case_line_id, cmd.reason);
        Ok(case_line)
    }

    /// 按行状态刷新工单头
    async fn refresh_case(
        &self,
        uow: &mut dyn UnitOfWork,
        case_id: GuaranteeCaseId,
    ) -> AppResult<()> {
        let mut case = uow.get_guarantee_case(case_id).await?;
        let lines = uow.case_lines_for_case(case_id).await?;
        case.refresh_from_lines(&lines);
        uow.save_guarantee_case(&case).await?;
        Ok(())
    }
}
