//! 配件保管权值对象
//!
//! 一个物理配件在任意时刻只有一个保管方：仓库、持有人、
//! 车辆或在途调拨，互斥性由和类型结构保证。

use common::UserId;
use serde::{Deserialize, Serialize};

use super::{TransferRequestId, Vin, WarehouseId};
use crate::domain::enums::ComponentStatus;

/// 配件保管权
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Custody {
    /// 在仓库
    Warehouse { warehouse_id: WarehouseId },
    /// 在技师/员工手上
    Holder { user_id: UserId },
    /// 已装车
    Vehicle { vin: Vin },
    /// 跨仓调拨在途
    InTransit { transfer_request_id: TransferRequestId },
}

impl Custody {
    pub fn warehouse(warehouse_id: WarehouseId) -> Self {
        Self::Warehouse { warehouse_id }
    }

    pub fn holder(user_id: UserId) -> Self {
        Self::Holder { user_id }
    }

    pub fn vehicle(vin: Vin) -> Self {
        Self::Vehicle { vin }
    }

    pub fn in_transit(transfer_request_id: TransferRequestId) -> Self {
        Self::InTransit { transfer_request_id }
    }

    /// 保管权与配件状态是否一致
    ///
    /// 每次写入都走这一处检查，而不是在各转换里各写一套。
    pub fn is_consistent_with(&self, status: ComponentStatus) -> bool {
        match status {
            ComponentStatus::InWarehouse | ComponentStatus::Reserved | ComponentStatus::Returned => {
                matches!(self, Custody::Warehouse { .. })
            }
            ComponentStatus::InTransit => matches!(self, Custody::InTransit { .. }),
            ComponentStatus::WithTechnician => matches!(self, Custody::Holder { .. }),
            ComponentStatus::Installed => matches!(self, Custody::Vehicle { .. }),
        }
    }

    /// 当前保管仓库（不在仓库则为 None）
    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        match self {
            Custody::Warehouse { warehouse_id } => Some(*warehouse_id),
            _ => None,
        }
    }
}
