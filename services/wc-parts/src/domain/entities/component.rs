//! 物理配件实体
//!
//! 按序列号识别的单件。状态与保管权必须成对变化，
//! 所有转换都经过同一处 `transition` 一致性检查。

use chrono::{DateTime, Utc};
use common::{AuditInfo, UserId};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::enums::ComponentStatus;
use crate::domain::value_objects::{
    ComponentId, Custody, ReservationId, SerialNumber, TransferRequestId, TypeComponentId, Vin,
    WarehouseId,
};

/// 物理配件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    id: ComponentId,
    type_component_id: TypeComponentId,
    serial_number: SerialNumber,
    status: ComponentStatus,
    custody: Custody,
    /// 占用本件的工单行预留
    reservation_id: Option<ReservationId>,
    /// 占用本件的调拨申请
    transfer_request_id: Option<TransferRequestId>,
    installed_at: Option<DateTime<Utc>>,
    audit_info: AuditInfo,
}

impl Component {
    /// 入库登记新配件
    pub fn register(
        type_component_id: TypeComponentId,
        serial_number: SerialNumber,
        warehouse_id: WarehouseId,
    ) -> Self {
        Self {
            id: ComponentId::new(),
            type_component_id,
            serial_number,
            status: ComponentStatus::InWarehouse,
            custody: Custody::warehouse(warehouse_id),
            reservation_id: None,
            transfer_request_id: None,
            installed_at: None,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ComponentId,
        type_component_id: TypeComponentId,
        serial_number: SerialNumber,
        status: ComponentStatus,
        custody: Custody,
        reservation_id: Option<ReservationId>,
        transfer_request_id: Option<TransferRequestId>,
        installed_at: Option<DateTime<Utc>>,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            type_component_id,
            serial_number,
            status,
            custody,
            reservation_id,
            transfer_request_id,
            installed_at,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn type_component_id(&self) -> TypeComponentId {
        self.type_component_id
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }

    pub fn status(&self) -> ComponentStatus {
        self.status
    }

    pub fn custody(&self) -> &Custody {
        &self.custody
    }

    pub fn reservation_id(&self) -> Option<ReservationId> {
        self.reservation_id
    }

    pub fn transfer_request_id(&self) -> Option<TransferRequestId> {
        self.transfer_request_id
    }

    pub fn installed_at(&self) -> Option<DateTime<Utc>> {
        self.installed_at
    }

    // ========== 状态转换 ==========

    /// 为工单行预留占用本件：IN_WAREHOUSE → RESERVED
    pub fn reserve_for_case_line(&mut self, reservation_id: ReservationId) -> AppResult<()> {
        if !self.status.is_available() {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "reserve",
            ));
        }
        self.reservation_id = Some(reservation_id);
        self.transition(ComponentStatus::Reserved, self.custody.clone())
    }

    /// 为调拨占用本件：IN_WAREHOUSE → RESERVED
    pub fn reserve_for_transfer(&mut self, transfer_request_id: TransferRequestId) -> AppResult<()> {
        if !self.status.is_available() {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "reserve",
            ));
        }
        self.transfer_request_id = Some(transfer_request_id);
        self.transition(ComponentStatus::Reserved, self.custody.clone())
    }

    /// 随调拨发运：RESERVED → IN_TRANSIT
    pub fn ship(&mut self) -> AppResult<()> {
        if self.status != ComponentStatus::Reserved {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "ship",
            ));
        }
        let transfer_request_id = self.transfer_request_id.ok_or_else(|| {
            AppError::invariant_violation(format!(
                "component {} shipped without a linked transfer request",
                self.id
            ))
        })?;
        self.transition(ComponentStatus::InTransit, Custody::in_transit(transfer_request_id))
    }

    /// 调拨到货：IN_TRANSIT → IN_WAREHOUSE（目的仓）
    pub fn arrive(&mut self, warehouse_id: WarehouseId) -> AppResult<()> {
        if self.status != ComponentStatus::InTransit {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "arrive",
            ));
        }
        self.transfer_request_id = None;
        self.transition(ComponentStatus::InWarehouse, Custody::warehouse(warehouse_id))
    }

    /// 技师领取：RESERVED → WITH_TECHNICIAN
    pub fn hand_to_technician(&mut self, technician_id: UserId) -> AppResult<()> {
        if self.status != ComponentStatus::Reserved {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "hand to technician",
            ));
        }
        self.transition(ComponentStatus::WithTechnician, Custody::holder(technician_id))
    }

    /// 装车：WITH_TECHNICIAN → INSTALLED
    pub fn install(&mut self, vin: Vin) -> AppResult<()> {
        if self.status != ComponentStatus::WithTechnician {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "install",
            ));
        }
        self.installed_at = Some(Utc::now());
        self.transition(ComponentStatus::Installed, Custody::vehicle(vin))
    }

    /// 释放回库：RESERVED/WITH_TECHNICIAN → IN_WAREHOUSE（预留取消）
    pub fn release_to_warehouse(&mut self, warehouse_id: WarehouseId) -> AppResult<()> {
        if !matches!(
            self.status,
            ComponentStatus::Reserved | ComponentStatus::WithTechnician
        ) {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "release",
            ));
        }
        self.reservation_id = None;
        self.transfer_request_id = None;
        self.transition(ComponentStatus::InWarehouse, Custody::warehouse(warehouse_id))
    }

    /// 退回：WITH_TECHNICIAN/INSTALLED → RETURNED（缺陷件/撤回）
    pub fn return_to_warehouse(&mut self, warehouse_id: WarehouseId) -> AppResult<()> {
        if !matches!(
            self.status,
            ComponentStatus::WithTechnician | ComponentStatus::Installed
        ) {
            return Err(AppError::invalid_transition(
                "component",
                self.status.as_str(),
                "return",
            ));
        }
        self.transition(ComponentStatus::Returned, Custody::warehouse(warehouse_id))
    }

    /// 唯一的写入口：状态与保管权成对更新并检查一致性
    fn transition(&mut self, status: ComponentStatus, custody: Custody) -> AppResult<()> {
        if !custody.is_consistent_with(status) {
            return Err(AppError::invariant_violation(format!(
                "component {} custody does not match status {}",
                self.id,
                status.as_str()
            )));
        }
        self.status = status;
        self.custody = custody;
        Ok(())
    }
}

impl Entity for Component {
    type Id = ComponentId;

    fn id(&self) -> &ComponentId {
        &self.id
    }
}

impl AggregateRoot for Component {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
