//! 任务指派实体

use chrono::{DateTime, Utc};
use common::{AuditInfo, UserId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::TaskType;
use crate::domain::value_objects::{CaseLineId, TaskAssignmentId};

/// 任务指派
///
/// 同一工单行同一任务类型至多一条活跃指派，
/// 由协调器在插入新指派前先停用旧指派保证。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    id: TaskAssignmentId,
    case_line_id: CaseLineId,
    technician_id: UserId,
    task_type: TaskType,
    assigned_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    is_active: bool,
    audit_info: AuditInfo,
}

impl TaskAssignment {
    /// 创建新指派
    pub fn new(case_line_id: CaseLineId, technician_id: UserId, task_type: TaskType) -> Self {
        Self {
            id: TaskAssignmentId::new(),
            case_line_id,
            technician_id,
            task_type,
            assigned_at: Utc::now(),
            completed_at: None,
            is_active: true,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TaskAssignmentId,
        case_line_id: CaseLineId,
        technician_id: UserId,
        task_type: TaskType,
        assigned_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        is_active: bool,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            case_line_id,
            technician_id,
            task_type,
            assigned_at,
            completed_at,
            is_active,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn case_line_id(&self) -> CaseLineId {
        self.case_line_id
    }

    pub fn technician_id(&self) -> &UserId {
        &self.technician_id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    // ========== 状态转换 ==========

    /// 改派时停用：is_active=false，completed_at 保持为空
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// 完成：记录完成时间并停用
    pub fn complete(&mut self) -> AppResult<()> {
        if !self.is_active {
            return Err(AppError::already_completed(format!(
                "task assignment {} is no longer active",
                self.id
            )));
        }
        self.completed_at = Some(Utc::now());
        self.is_active = false;
        Ok(())
    }
}

impl Entity for TaskAssignment {
    type Id = TaskAssignmentId;

    fn id(&self) -> &TaskAssignmentId {
        &self.id
    }
}

impl AggregateRoot for TaskAssignment {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
