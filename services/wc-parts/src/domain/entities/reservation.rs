//! 预留实体
//!
//! Reservation 面向工单行，StockReservation 面向调拨行项。
//! 两者的创建/销毁只允许由预留管理器与调拨工作流发起。

use chrono::{DateTime, Utc};
use common::{AuditInfo, UserId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::{ReservationStatus, StockReservationStatus};
use crate::domain::value_objects::{
    CaseLineId, ReservationId, StockReservationId, TransferItemId, TypeComponentId, WarehouseId,
};

/// 工单行预留
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    case_line_id: CaseLineId,
    warehouse_id: WarehouseId,
    type_component_id: TypeComponentId,
    quantity: i64,
    status: ReservationStatus,
    picked_by: Option<UserId>,
    picked_at: Option<DateTime<Utc>>,
    used_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    audit_info: AuditInfo,
}

impl Reservation {
    /// 创建新预留（与库存行预留增量同事务写入）
    pub fn new(
        case_line_id: CaseLineId,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        quantity: i64,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            case_line_id,
            warehouse_id,
            type_component_id,
            quantity,
            status: ReservationStatus::Reserved,
            picked_by: None,
            picked_at: None,
            used_at: None,
            cancellation_reason: None,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ReservationId,
        case_line_id: CaseLineId,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        quantity: i64,
        status: ReservationStatus,
        picked_by: Option<UserId>,
        picked_at: Option<DateTime<Utc>>,
        used_at: Option<DateTime<Utc>>,
        cancellation_reason: Option<String>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            case_line_id,
            warehouse_id,
            type_component_id,
            quantity,
            status,
            picked_by,
            picked_at,
            used_at,
            cancellation_reason,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn case_line_id(&self) -> CaseLineId {
        self.case_line_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn type_component_id(&self) -> TypeComponentId {
        self.type_component_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn picked_by(&self) -> Option<&UserId> {
        self.picked_by.as_ref()
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn picked_at(&self) -> Option<DateTime<Utc>> {
        self.picked_at
    }

    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        self.used_at
    }

    // ========== 状态转换 ==========

    /// 领取：RESERVED → PICKED
    pub fn pick(&mut self, picked_by: UserId) -> AppResult<()> {
        if !self.status.is_pickable() {
            return Err(AppError::not_pickable(format!(
                "reservation {} is {}",
                self.id,
                self.status.as_str()
            )));
        }
        self.status = ReservationStatus::Picked;
        self.picked_by = Some(picked_by);
        self.picked_at = Some(Utc::now());
        Ok(())
    }

    /// 装车消耗：PICKED → USED
    pub fn mark_used(&mut self) -> AppResult<()> {
        if self.status != ReservationStatus::Picked {
            return Err(AppError::invalid_transition(
                "reservation",
                self.status.as_str(),
                "use",
            ));
        }
        self.status = ReservationStatus::Used;
        self.used_at = Some(Utc::now());
        Ok(())
    }

    /// 取消：RESERVED/PICKED → CANCELLED
    ///
    /// 已是 CANCELLED/USED 时幂等返回 false，不做任何改动。
    pub fn cancel(&mut self, reason: impl Into<String>) -> AppResult<bool> {
        match self.status {
            ReservationStatus::Cancelled | ReservationStatus::Used => Ok(false),
            ReservationStatus::Reserved | ReservationStatus::Picked => {
                self.status = ReservationStatus::Cancelled;
                self.cancellation_reason = Some(reason.into());
                Ok(true)
            }
        }
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> &ReservationId {
        &self.id
    }
}

impl AggregateRoot for Reservation {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

/// 调拨预留
///
/// 把源仓库存 earmark 给某个调拨行项，发运前占住可用量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReservation {
    id: StockReservationId,
    transfer_item_id: TransferItemId,
    warehouse_id: WarehouseId,
    type_component_id: TypeComponentId,
    quantity_reserved: i64,
    status: StockReservationStatus,
    audit_info: AuditInfo,
}

impl StockReservation {
    /// 创建新调拨预留
    pub fn new(
        transfer_item_id: TransferItemId,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        quantity_reserved: i64,
    ) -> Self {
        Self {
            id: StockReservationId::new(),
            transfer_item_id,
            warehouse_id,
            type_component_id,
            quantity_reserved,
            status: StockReservationStatus::Reserved,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: StockReservationId,
        transfer_item_id: TransferItemId,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        quantity_reserved: i64,
        status: StockReservationStatus,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            transfer_item_id,
            warehouse_id,
            type_component_id,
            quantity_reserved,
            status,
            audit_info,
        }
    }

    pub fn transfer_item_id(&self) -> TransferItemId {
        self.transfer_item_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn type_component_id(&self) -> TypeComponentId {
        self.type_component_id
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    pub fn status(&self) -> StockReservationStatus {
        self.status
    }

    /// 发运：RESERVED → SHIPPED
    pub fn ship(&mut self) -> AppResult<()> {
        if self.status != StockReservationStatus::Reserved {
            return Err(AppError::invalid_transition(
                "stock reservation",
                self.status.as_str(),
                "ship",
            ));
        }
        self.status = StockReservationStatus::Shipped;
        Ok(())
    }

    /// 取消：RESERVED → CANCELLED（调拨驳回/取消时释放源仓预留）
    pub fn cancel(&mut self) -> AppResult<()> {
        if self.status != StockReservationStatus::Reserved {
            return Err(AppError::invalid_transition(
                "stock reservation",
                self.status.as_str(),
                "cancel",
            ));
        }
        self.status = StockReservationStatus::Cancelled;
        Ok(())
    }
}

impl Entity for StockReservation {
    type Id = StockReservationId;

    fn id(&self) -> &StockReservationId {
        &self.id
    }
}

impl AggregateRoot for StockReservation {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation() -> Reservation {
        Reservation::new(CaseLineId::new(), WarehouseId::new(), TypeComponentId::new(), 2)
    }

    #[test]
    fn test_pick_requires_reserved() {
        let mut r = reservation();
        r.pick(UserId::new()).unwrap();
        assert_eq!(r.status(), ReservationStatus::Picked);
        assert!(r.picked_at().is_some());

        let err = r.pick(UserId::new()).unwrap_err();
        assert!(matches!(err, AppError::ReservationNotPickable(_)));
    }

    #[test]
    fn test_use_requires_picked() {
        let mut r = reservation();
        let err = r.mark_used().unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));

        r.pick(UserId::new()).unwrap();
        r.mark_used().unwrap();
        assert_eq!(r.status(), ReservationStatus::Used);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut r = reservation();
        assert!(r.cancel("defect").unwrap());
        assert!(!r.cancel("defect again").unwrap());
        assert_eq!(r.cancellation_reason(), Some("defect"));

        let mut used = reservation();
        used.pick(UserId::new()).unwrap();
        used.mark_used().unwrap();
        assert!(!used.cancel("too late").unwrap());
        assert_eq!(used.status(), ReservationStatus::Used);
    }
}
