//! 任务派工命令

use common::UserId;

use crate::domain::enums::TaskType;
use crate::domain::value_objects::{CaseLineId, TaskAssignmentId};

/// 派工命令（同类型重派会替换旧的在岗分配）
#[derive(Debug, Clone)]
pub struct AssignTaskCommand {
    pub user_id: UserId,
    pub case_line_id: CaseLineId,
    pub technician_id: UserId,
    pub task_type: TaskType,
}

/// 任务完成命令
#[derive(Debug, Clone)]
pub struct CompleteTaskCommand {
    pub user_id: UserId,
    pub task_assignment_id: TaskAssignmentId,
}
