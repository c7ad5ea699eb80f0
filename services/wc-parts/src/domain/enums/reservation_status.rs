//! 预留状态枚举

use serde::{Deserialize, Serialize};

/// 工单行预留状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// 已预留
    Reserved,
    /// 已领取
    Picked,
    /// 已装车消耗
    Used,
    /// 已取消
    Cancelled,
}

impl ReservationStatus {
    /// 是否可领取
    pub fn is_pickable(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Used | ReservationStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "RESERVED",
            ReservationStatus::Picked => "PICKED",
            ReservationStatus::Used => "USED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RESERVED" => Some(ReservationStatus::Reserved),
            "PICKED" => Some(ReservationStatus::Picked),
            "USED" => Some(ReservationStatus::Used),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }
}

/// 调拨预留状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockReservationStatus {
    /// 已为调拨预留
    Reserved,
    /// 已随调拨发运
    Shipped,
    /// 已取消
    Cancelled,
}

impl StockReservationStatus {
    /// 是否仍占用源仓可用量
    pub fn holds_stock(&self) -> bool {
        matches!(self, StockReservationStatus::Reserved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockReservationStatus::Reserved => "RESERVED",
            StockReservationStatus::Shipped => "SHIPPED",
            StockReservationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RESERVED" => Some(StockReservationStatus::Reserved),
            "SHIPPED" => Some(StockReservationStatus::Shipped),
            "CANCELLED" => Some(StockReservationStatus::Cancelled),
            _ => None,
        }
    }
}
