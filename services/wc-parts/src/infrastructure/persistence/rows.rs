//! 数据库行映射结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// 仓库数据库行
#[derive(Debug, FromRow)]
pub struct WarehouseRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 库存行数据库行
#[derive(Debug, FromRow)]
pub struct StockLineRow {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_in_stock: i64,
    pub quantity_reserved: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 候选源仓查询行（库存行联查仓库优先级）
#[derive(Debug, FromRow)]
pub struct StockCandidateRow {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_in_stock: i64,
    pub quantity_reserved: i64,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
    pub warehouse_priority: i32,
}

/// 工单行预留数据库行
#[derive(Debug, FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub case_line_id: Uuid,
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity: i64,
    pub status: String,
    pub picked_by: Option<Uuid>,
    pub picked_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 调拨预留数据库行
#[derive(Debug, FromRow)]
pub struct StockReservationRow {
    pub id: Uuid,
    pub transfer_item_id: Uuid,
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_reserved: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 调拨申请数据库行
#[derive(Debug, FromRow)]
pub struct TransferRequestRow {
    pub id: Uuid,
    pub requesting_warehouse_id: Uuid,
    pub requested_by: Uuid,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub received_by: Option<Uuid>,
    pub received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 调拨申请明细数据库行
#[derive(Debug, FromRow)]
pub struct TransferItemRow {
    pub id: Uuid,
    pub transfer_request_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_requested: i64,
    pub quantity_reserved: i64,
    pub source_warehouse_id: Option<Uuid>,
    pub case_line_id: Option<Uuid>,
}

/// 物理配件数据库行
///
/// 保管权以 JSONB 存单列，和类型结构不摊平成多列。
#[derive(Debug, FromRow)]
pub struct ComponentRow {
    pub id: Uuid,
    pub type_component_id: Uuid,
    pub serial_number: String,
    pub status: String,
    pub custody: serde_json::Value,
    pub reservation_id: Option<Uuid>,
    pub transfer_request_id: Option<Uuid>,
    pub installed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 工单行数据库行
#[derive(Debug, FromRow)]
pub struct CaseLineRow {
    pub id: Uuid,
    pub guarantee_case_id: Uuid,
    pub diagnosis_text: String,
    pub correction_text: String,
    pub type_component_id: Option<Uuid>,
    pub quantity_needed: i64,
    pub warranty_status: String,
    pub status: String,
    pub technician_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 保修工单数据库行
#[derive(Debug, FromRow)]
pub struct GuaranteeCaseRow {
    pub id: Uuid,
    pub vin: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 任务指派数据库行
#[derive(Debug, FromRow)]
pub struct TaskAssignmentRow {
    pub id: Uuid,
    pub case_line_id: Uuid,
    pub technician_id: Uuid,
    pub task_type: String,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// 库存汇总查询行
#[derive(Debug, FromRow)]
pub struct InventorySummaryRow {
    pub warehouse_id: Uuid,
    pub total_in_stock: i64,
    pub total_reserved: i64,
}

/// 库存明细查询行
#[derive(Debug, FromRow)]
pub struct TypeComponentStockRow {
    pub warehouse_id: Uuid,
    pub type_component_id: Uuid,
    pub quantity_in_stock: i64,
    pub quantity_reserved: i64,
}
