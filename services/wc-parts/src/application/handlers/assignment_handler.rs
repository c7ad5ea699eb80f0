//! 任务派工处理器
//!
//! 每工单行每任务类型至多一条在岗分配；重派替换旧分配且不声称其已完成。

use std::sync::Arc;

use common::retry::retry_once;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use ports::NotificationDispatcher;
use tracing::info;

use crate::domain::entities::TaskAssignment;
use crate::domain::enums::TaskType;
use crate::domain::events::{EventMetadata, PartsEvent};
use crate::domain::unit_of_work::UnitOfWorkFactory;

use crate::application::commands::*;

use super::notify;

pub struct AssignmentHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl AssignmentHandler {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            uow_factory,
            notifier,
        }
    }

    /// 派工；同类型已有在岗分配时先将其下岗
    pub async fn assign(&self, cmd: AssignTaskCommand) -> AppResult<TaskAssignment> {
        retry_once(|| self.assign_inner(&cmd), AppError::is_retryable).await
    }

    async fn assign_inner(&self, cmd: &AssignTaskCommand) -> AppResult<TaskAssignment> {
        let mut uow = self.uow_factory.begin().await?;

        let mut case_line = uow.get_case_line(cmd.case_line_id).await?;
        if case_line.status().is_terminal() {
            return Err(AppError::invalid_transition(
                "case line",
                case_line.status().as_str(),
                "assign_task",
            ));
        }

        if let Some(mut previous) = uow
            .active_task_assignment(cmd.case_line_id, cmd.task_type)
            .await?
        {
            previous.deactivate();
            uow.save_task_assignment(&previous).await?;
            info!(
                "Assignment {} superseded on case line {}",
                previous.id(),
                cmd.case_line_id
            );
        }

        let mut assignment =
            TaskAssignment::new(cmd.case_line_id, cmd.technician_id, cmd.task_type);
        assignment.audit_info_mut().created_by = Some(cmd.user_id);
        uow.save_task_assignment(&assignment).await?;

        // 诊断任务落到行上意味着工单进入诊断阶段
        if cmd.task_type == TaskType::Diagnosis {
            let mut case = uow.get_guarantee_case(case_line.guarantee_case_id()).await?;
            case.start_diagnosis();
            uow.save_guarantee_case(&case).await?;
        }
        case_line.audit_info_mut().update(Some(cmd.user_id));
        uow.save_case_line(&case_line).await?;
        uow.commit().await?;

        info!(
            "Task {} assigned to technician {} on case line {}",
            assignment.id(),
            cmd.technician_id,
            cmd.case_line_id
        );
        notify(
            self.notifier.as_ref(),
            &PartsEvent::TaskAssigned {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                task_assignment_id: *assignment.id(),
                case_line_id: cmd.case_line_id,
                technician_id: cmd.technician_id,
            },
            &[cmd.technician_id],
        )
        .await;

        Ok(assignment)
    }

    /// 任务完成；重复完成被前置条件拦截
    pub async fn complete(&self, cmd: CompleteTaskCommand) -> AppResult<TaskAssignment> {
        retry_once(|| self.complete_inner(&cmd), AppError::is_retryable).await
    }

    async fn complete_inner(&self, cmd: &CompleteTaskCommand) -> AppResult<TaskAssignment> {
        let mut uow = self.uow_factory.begin().await?;

        let mut assignment = uow.get_task_assignment(cmd.task_assignment_id).await?;
        assignment.complete()?;
        assignment.audit_info_mut().update(Some(cmd.user_id));
        uow.save_task_assignment(&assignment).await?;
        uow.commit().await?;

        info!("Task assignment {} completed", cmd.task_assignment_id);
        notify(
            self.notifier.as_ref(),
            &PartsEvent::TaskCompleted {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                task_assignment_id: cmd.task_assignment_id,
                case_line_id: assignment.case_line_id(),
            },
            &[],
        )
        .await;
        Ok(assignment)
    }
}
