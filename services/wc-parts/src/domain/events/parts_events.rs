//! 配件领域事件
//!
//! 事件负载经 serde 序列化后交给通知派发端口（fire-and-forget）。

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{
    CaseLineId, ReservationId, TaskAssignmentId, TransferRequestId, TypeComponentId, WarehouseId,
};

/// 事件基础信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 事件 ID
    pub event_id: Uuid,
    /// 事件发生时间
    pub occurred_at: DateTime<Utc>,
    /// 操作用户 ID
    pub user_id: Option<UserId>,
}

impl EventMetadata {
    pub fn new(user_id: Option<UserId>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            user_id,
        }
    }
}

/// 配件领域事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartsEvent {
    /// 预留可用量不足
    ReservationShortfall {
        metadata: EventMetadata,
        case_line_id: CaseLineId,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        requested: i64,
        available: i64,
        shortfall: i64,
    },
    /// 调拨申请已创建
    TransferCreated {
        metadata: EventMetadata,
        transfer_request_id: TransferRequestId,
        requesting_warehouse_id: WarehouseId,
        has_shortfall: bool,
    },
    /// 调拨申请已审批
    TransferApproved {
        metadata: EventMetadata,
        transfer_request_id: TransferRequestId,
    },
    /// 调拨申请已驳回
    TransferRejected {
        metadata: EventMetadata,
        transfer_request_id: TransferRequestId,
        reason: String,
    },
    /// 调拨已发运
    TransferShipped {
        metadata: EventMetadata,
        transfer_request_id: TransferRequestId,
    },
    /// 调拨已收货
    TransferReceived {
        metadata: EventMetadata,
        transfer_request_id: TransferRequestId,
        receiving_warehouse_id: WarehouseId,
    },
    /// 任务已指派
    TaskAssigned {
        metadata: EventMetadata,
        task_assignment_id: TaskAssignmentId,
        case_line_id: CaseLineId,
        technician_id: UserId,
    },
    /// 任务已完成
    TaskCompleted {
        metadata: EventMetadata,
        task_assignment_id: TaskAssignmentId,
        case_line_id: CaseLineId,
    },
    /// 预留已取消
    ReservationCancelled {
        metadata: EventMetadata,
        reservation_id: ReservationId,
        reason: String,
    },
}

impl PartsEvent {
    /// 通知主题（派发端口按主题路由）
    pub fn topic(&self) -> &'static str {
        match self {
            PartsEvent::ReservationShortfall { .. } => "parts.reservation.shortfall",
            PartsEvent::TransferCreated { .. } => "parts.transfer.created",
            PartsEvent::TransferApproved { .. } => "parts.transfer.approved",
            PartsEvent::TransferRejected { .. } => "parts.transfer.rejected",
            PartsEvent::TransferShipped { .. } => "parts.transfer.shipped",
            PartsEvent::TransferReceived { .. } => "parts.transfer.received",
            PartsEvent::TaskAssigned { .. } => "parts.task.assigned",
            PartsEvent::TaskCompleted { .. } => "parts.task.completed",
            PartsEvent::ReservationCancelled { .. } => "parts.reservation.cancelled",
        }
    }
}
