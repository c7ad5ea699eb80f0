//! 物理配件状态枚举

use serde::{Deserialize, Serialize};

/// 物理配件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentStatus {
    /// 在库
    InWarehouse,
    /// 已被预留（工单行或调拨）
    Reserved,
    /// 跨仓调拨在途
    InTransit,
    /// 技师已领取
    WithTechnician,
    /// 已装车
    Installed,
    /// 已退回（缺陷件/撤回）
    Returned,
}

impl ComponentStatus {
    /// 是否可被预留
    pub fn is_available(&self) -> bool {
        matches!(self, ComponentStatus::InWarehouse)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComponentStatus::Returned)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::InWarehouse => "IN_WAREHOUSE",
            ComponentStatus::Reserved => "RESERVED",
            ComponentStatus::InTransit => "IN_TRANSIT",
            ComponentStatus::WithTechnician => "WITH_TECHNICIAN",
            ComponentStatus::Installed => "INSTALLED",
            ComponentStatus::Returned => "RETURNED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN_WAREHOUSE" => Some(ComponentStatus::InWarehouse),
            "RESERVED" => Some(ComponentStatus::Reserved),
            "IN_TRANSIT" => Some(ComponentStatus::InTransit),
            "WITH_TECHNICIAN" => Some(ComponentStatus::WithTechnician),
            "INSTALLED" => Some(ComponentStatus::Installed),
            "RETURNED" => Some(ComponentStatus::Returned),
            _ => None,
        }
    }
}
