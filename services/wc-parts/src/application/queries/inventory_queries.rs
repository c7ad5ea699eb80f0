//! 库存查询参数

use common::Pagination;

use crate::domain::value_objects::{TypeComponentId, WarehouseId};

/// 仓库库存汇总查询
#[derive(Debug, Clone)]
pub struct InventorySummaryQuery {
    /// 不指定时汇总所有仓库
    pub warehouse_id: Option<WarehouseId>,
    /// 指定时只汇总该件型的库存行
    pub type_component_id: Option<TypeComponentId>,
    pub pagination: Pagination,
}

/// 仓库分件型明细查询
#[derive(Debug, Clone)]
pub struct InventoryTypeComponentsQuery {
    pub warehouse_id: Option<WarehouseId>,
    pub type_component_id: Option<TypeComponentId>,
    pub pagination: Pagination,
}
