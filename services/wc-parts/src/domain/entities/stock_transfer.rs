//! 跨仓调拨申请聚合根

use chrono::{DateTime, Utc};
use common::{AuditInfo, UserId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::TransferStatus;
use crate::domain::value_objects::{
    CaseLineId, TransferItemId, TransferRequestId, TypeComponentId, WarehouseId,
};

/// 调拨申请行项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransferRequestItem {
    id: TransferItemId,
    type_component_id: TypeComponentId,
    quantity_requested: i64,
    /// 已在源仓 earmark 的数量（0 表示创建时无仓可满足）
    quantity_reserved: i64,
    /// earmark 的源仓
    source_warehouse_id: Option<WarehouseId>,
    /// 发起缺口的工单行（收货后自动回补预留）
    case_line_id: Option<CaseLineId>,
}

impl StockTransferRequestItem {
    pub fn new(
        type_component_id: TypeComponentId,
        quantity_requested: i64,
        case_line_id: Option<CaseLineId>,
    ) -> Self {
        Self {
            id: TransferItemId::new(),
            type_component_id,
            quantity_requested,
            quantity_reserved: 0,
            source_warehouse_id: None,
            case_line_id,
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: TransferItemId,
        type_component_id: TypeComponentId,
        quantity_requested: i64,
        quantity_reserved: i64,
        source_warehouse_id: Option<WarehouseId>,
        case_line_id: Option<CaseLineId>,
    ) -> Self {
        Self {
            id,
            type_component_id,
            quantity_requested,
            quantity_reserved,
            source_warehouse_id,
            case_line_id,
        }
    }

    pub fn id(&self) -> TransferItemId {
        self.id
    }

    pub fn type_component_id(&self) -> TypeComponentId {
        self.type_component_id
    }

    pub fn quantity_requested(&self) -> i64 {
        self.quantity_requested
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    pub fn source_warehouse_id(&self) -> Option<WarehouseId> {
        self.source_warehouse_id
    }

    pub fn case_line_id(&self) -> Option<CaseLineId> {
        self.case_line_id
    }

    /// 未能 earmark 的缺口量
    pub fn shortfall(&self) -> i64 {
        self.quantity_requested - self.quantity_reserved
    }

    /// 记录源仓 earmark 结果
    pub fn mark_reserved(&mut self, source_warehouse_id: WarehouseId, qty: i64) {
        self.source_warehouse_id = Some(source_warehouse_id);
        self.quantity_reserved = qty;
    }
}

/// 跨仓调拨申请聚合根
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransferRequest {
    id: TransferRequestId,
    requesting_warehouse_id: WarehouseId,
    requested_by: UserId,
    status: TransferStatus,
    items: Vec<StockTransferRequestItem>,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
    rejected_by: Option<UserId>,
    rejected_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    cancelled_by: Option<UserId>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    shipped_at: Option<DateTime<Utc>>,
    received_by: Option<UserId>,
    received_at: Option<DateTime<Utc>>,
    audit_info: AuditInfo,
}

impl StockTransferRequest {
    /// 创建调拨申请（进入待审批）
    pub fn new(
        requesting_warehouse_id: WarehouseId,
        requested_by: UserId,
        items: Vec<StockTransferRequestItem>,
    ) -> AppResult<Self> {
        if items.is_empty() {
            return Err(AppError::validation("调拨申请至少需要一个行项"));
        }
        for item in &items {
            if item.quantity_requested() <= 0 {
                return Err(AppError::invalid_quantity(format!(
                    "quantity must be positive, got {}",
                    item.quantity_requested()
                )));
            }
        }
        Ok(Self {
            id: TransferRequestId::new(),
            requesting_warehouse_id,
            requested_by,
            status: TransferStatus::PendingApproval,
            items,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            shipped_at: None,
            received_by: None,
            received_at: None,
            audit_info: AuditInfo::default(),
        })
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TransferRequestId,
        requesting_warehouse_id: WarehouseId,
        requested_by: UserId,
        status: TransferStatus,
        items: Vec<StockTransferRequestItem>,
        approved_by: Option<UserId>,
        approved_at: Option<DateTime<Utc>>,
        rejected_by: Option<UserId>,
        rejected_at: Option<DateTime<Utc>>,
        rejection_reason: Option<String>,
        cancelled_by: Option<UserId>,
        cancelled_at: Option<DateTime<Utc>>,
        cancellation_reason: Option<String>,
        shipped_at: Option<DateTime<Utc>>,
        received_by: Option<UserId>,
        received_at: Option<DateTime<Utc>>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            requesting_warehouse_id,
            requested_by,
            status,
            items,
            approved_by,
            approved_at,
            rejected_by,
            rejected_at,
            rejection_reason,
            cancelled_by,
            cancelled_at,
            cancellation_reason,
            shipped_at,
            received_by,
            received_at,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn requesting_warehouse_id(&self) -> WarehouseId {
        self.requesting_warehouse_id
    }

    pub fn requested_by(&self) -> &UserId {
        &self.requested_by
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn items(&self) -> &[StockTransferRequestItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [StockTransferRequestItem] {
        &mut self.items
    }

    pub fn approved_by(&self) -> Option<&UserId> {
        self.approved_by.as_ref()
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn rejected_by(&self) -> Option<&UserId> {
        self.rejected_by.as_ref()
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    pub fn cancelled_by(&self) -> Option<&UserId> {
        self.cancelled_by.as_ref()
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn received_by(&self) -> Option<&UserId> {
        self.received_by.as_ref()
    }

    /// 是否存在创建时未能完全 earmark 的行项
    pub fn has_shortfall(&self) -> bool {
        self.items.iter().any(|i| i.shortfall() > 0)
    }

    // ========== 状态转换 ==========
    // 守卫先行：不允许的转换直接失败，不得触达任何库存。

    /// 审批通过：PENDING_APPROVAL → APPROVED，无库存移动
    pub fn approve(&mut self, approved_by: UserId) -> AppResult<()> {
        self.guard(TransferStatus::PendingApproval, "approve")?;
        self.status = TransferStatus::Approved;
        self.approved_by = Some(approved_by);
        self.approved_at = Some(Utc::now());
        Ok(())
    }

    /// 驳回：PENDING_APPROVAL → REJECTED，要求非空理由
    pub fn reject(&mut self, rejected_by: UserId, reason: impl Into<String>) -> AppResult<()> {
        self.guard(TransferStatus::PendingApproval, "reject")?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(AppError::validation("驳回理由不能为空"));
        }
        self.status = TransferStatus::Rejected;
        self.rejected_by = Some(rejected_by);
        self.rejected_at = Some(Utc::now());
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// 发运：APPROVED → SHIPPED
    pub fn ship(&mut self) -> AppResult<()> {
        self.guard(TransferStatus::Approved, "ship")?;
        self.status = TransferStatus::Shipped;
        self.shipped_at = Some(Utc::now());
        Ok(())
    }

    /// 收货：SHIPPED → RECEIVED
    pub fn receive(&mut self, received_by: UserId) -> AppResult<()> {
        self.guard(TransferStatus::Shipped, "receive")?;
        self.status = TransferStatus::Received;
        self.received_by = Some(received_by);
        self.received_at = Some(Utc::now());
        Ok(())
    }

    /// 取消：仅发运前允许，要求非空理由
    pub fn cancel(&mut self, cancelled_by: UserId, reason: impl Into<String>) -> AppResult<()> {
        if !self.status.can_cancel() {
            return Err(AppError::invalid_transition(
                "stock transfer request",
                self.status.as_str(),
                "cancel",
            ));
        }
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(AppError::validation("取消理由不能为空"));
        }
        self.status = TransferStatus::Cancelled;
        self.cancelled_by = Some(cancelled_by);
        self.cancelled_at = Some(Utc::now());
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    fn guard(&self, expected: TransferStatus, action: &'static str) -> AppResult<()> {
        if self.status != expected {
            return Err(AppError::invalid_transition(
                "stock transfer request",
                self.status.as_str(),
                action,
            ));
        }
        Ok(())
    }
}

impl Entity for StockTransferRequest {
    type Id = TransferRequestId;

    fn id(&self) -> &TransferRequestId {
        &self.id
    }
}

impl AggregateRoot for StockTransferRequest {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
