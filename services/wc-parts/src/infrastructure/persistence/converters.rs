//! 数据库行到领域对象的转换

use chrono::{DateTime, Utc};
use common::types::{AuditInfo, UserId};
use errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::entities::{
    CaseLine, Component, GuaranteeCase, Reservation, StockLine, StockReservation,
    StockTransferRequest, StockTransferRequestItem, TaskAssignment, Warehouse,
};
use crate::domain::enums::{
    CaseLineStatus, ComponentStatus, GuaranteeCaseStatus, ReservationStatus,
    StockReservationStatus, TaskType, TransferStatus, WarrantyStatus,
};
use crate::domain::value_objects::{
    CaseLineId, ComponentId, Custody, GuaranteeCaseId, ReservationId, SerialNumber, StockLineId,
    StockReservationId, TaskAssignmentId, TransferItemId, TransferRequestId, TypeComponentId, Vin,
    WarehouseId,
};

use super::rows::*;

fn build_audit_info(
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
) -> AuditInfo {
    AuditInfo {
        created_at,
        created_by: created_by.map(UserId),
        updated_at,
        updated_by: updated_by.map(UserId),
    }
}

/// 解析数据库里的状态文本；库里出现未知值说明数据被绕过应用写入
fn parse_status<T>(parsed: Option<T>, column: &str, raw: &str) -> AppResult<T> {
    parsed.ok_or_else(|| {
        AppError::database(format!("invalid {} value in database: {}", column, raw))
    })
}

pub fn warehouse_from_row(row: WarehouseRow) -> Warehouse {
    Warehouse::from_parts(
        WarehouseId::from_uuid(row.id),
        row.code,
        row.name,
        row.priority,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    )
}

pub fn stock_line_from_row(row: StockLineRow) -> StockLine {
    StockLine::from_parts(
        StockLineId::from_uuid(row.id),
        WarehouseId::from_uuid(row.warehouse_id),
        TypeComponentId::from_uuid(row.type_component_id),
        row.quantity_in_stock,
        row.quantity_reserved,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    )
}

pub fn reservation_from_row(row: ReservationRow) -> AppResult<Reservation> {
    let status = parse_status(ReservationStatus::parse(&row.status), "status", &row.status)?;
    Ok(Reservation::from_parts(
        ReservationId::from_uuid(row.id),
        CaseLineId::from_uuid(row.case_line_id),
        WarehouseId::from_uuid(row.warehouse_id),
        TypeComponentId::from_uuid(row.type_component_id),
        row.quantity,
        status,
        row.picked_by.map(UserId),
        row.picked_at,
        row.used_at,
        row.cancellation_reason,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

pub fn stock_reservation_from_row(row: StockReservationRow) -> AppResult<StockReservation> {
    let status = parse_status(
        StockReservationStatus::parse(&row.status),
        "status",
        &row.status,
    )?;
    Ok(StockReservation::from_parts(
        StockReservationId::from_uuid(row.id),
        TransferItemId::from_uuid(row.transfer_item_id),
        WarehouseId::from_uuid(row.warehouse_id),
        TypeComponentId::from_uuid(row.type_component_id),
        row.quantity_reserved,
        status,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

pub fn transfer_item_from_row(row: TransferItemRow) -> StockTransferRequestItem {
    StockTransferRequestItem::from_parts(
        TransferItemId::from_uuid(row.id),
        TypeComponentId::from_uuid(row.type_component_id),
        row.quantity_requested,
        row.quantity_reserved,
        row.source_warehouse_id.map(WarehouseId::from_uuid),
        row.case_line_id.map(CaseLineId::from_uuid),
    )
}

pub fn transfer_request_from_row(
    row: TransferRequestRow,
    items: Vec<StockTransferRequestItem>,
) -> AppResult<StockTransferRequest> {
    let status = parse_status(TransferStatus::parse(&row.status), "status", &row.status)?;
    Ok(StockTransferRequest::from_parts(
        TransferRequestId::from_uuid(row.id),
        WarehouseId::from_uuid(row.requesting_warehouse_id),
        UserId(row.requested_by),
        status,
        items,
        row.approved_by.map(UserId),
        row.approved_at,
        row.rejected_by.map(UserId),
        row.rejected_at,
        row.rejection_reason,
        row.cancelled_by.map(UserId),
        row.cancelled_at,
        row.cancellation_reason,
        row.shipped_at,
        row.received_by.map(UserId),
        row.received_at,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

pub fn component_from_row(row: ComponentRow) -> AppResult<Component> {
    let status = parse_status(ComponentStatus::parse(&row.status), "status", &row.status)?;
    let serial = SerialNumber::new(row.serial_number)
        .map_err(|e| AppError::database(format!("invalid serial_number in database: {}", e)))?;
    let custody: Custody = serde_json::from_value(row.custody)
        .map_err(|e| AppError::database(format!("invalid custody in database: {}", e)))?;
    Ok(Component::from_parts(
        ComponentId::from_uuid(row.id),
        TypeComponentId::from_uuid(row.type_component_id),
        serial,
        status,
        custody,
        row.reservation_id.map(ReservationId::from_uuid),
        row.transfer_request_id.map(TransferRequestId::from_uuid),
        row.installed_at,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

pub fn case_line_from_row(row: CaseLineRow) -> AppResult<CaseLine> {
    let warranty_status = parse_status(
        WarrantyStatus::parse(&row.warranty_status),
        "warranty_status",
        &row.warranty_status,
    )?;
    let status = parse_status(CaseLineStatus::parse(&row.status), "status", &row.status)?;
    Ok(CaseLine::from_parts(
        CaseLineId::from_uuid(row.id),
        GuaranteeCaseId::from_uuid(row.guarantee_case_id),
        row.diagnosis_text,
        row.correction_text,
        row.type_component_id.map(TypeComponentId::from_uuid),
        row.quantity_needed,
        warranty_status,
        status,
        UserId(row.technician_id),
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

pub fn guarantee_case_from_row(row: GuaranteeCaseRow) -> AppResult<GuaranteeCase> {
    let status = parse_status(
        GuaranteeCaseStatus::parse(&row.status),
        "status",
        &row.status,
    )?;
    let vin = Vin::new(row.vin)
        .map_err(|e| AppError::database(format!("invalid vin in database: {}", e)))?;
    Ok(GuaranteeCase::from_parts(
        GuaranteeCaseId::from_uuid(row.id),
        vin,
        status,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}

pub fn task_assignment_from_row(row: TaskAssignmentRow) -> AppResult<TaskAssignment> {
    let task_type = parse_status(TaskType::parse(&row.task_type), "task_type", &row.task_type)?;
    Ok(TaskAssignment::from_parts(
        TaskAssignmentId::from_uuid(row.id),
        CaseLineId::from_uuid(row.case_line_id),
        UserId(row.technician_id),
        task_type,
        row.assigned_at,
        row.completed_at,
        row.is_active,
        build_audit_info(row.created_at, row.created_by, row.updated_at, row.updated_by),
    ))
}
