//! 库存查询仓储接口（面板只读路径）
//!
//! 只读聚合走快照读，不占行锁。

use async_trait::async_trait;
use common::{PagedResult, Pagination};
use errors::AppResult;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{TypeComponentId, WarehouseId};

/// 库存查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub type_component_id: Option<TypeComponentId>,
}

/// 按仓库聚合的库存摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseInventorySummary {
    pub warehouse_id: WarehouseId,
    pub total_in_stock: i64,
    pub total_reserved: i64,
    pub total_available: i64,
}

/// 单个库存行的面板视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeComponentStock {
    pub warehouse_id: WarehouseId,
    pub type_component_id: TypeComponentId,
    pub quantity_in_stock: i64,
    pub quantity_reserved: i64,
    pub quantity_available: i64,
}

/// 库存查询仓储接口
#[async_trait]
pub trait InventoryQueryRepository: Send + Sync {
    /// 按仓库聚合库存摘要
    async fn get_inventory_summary(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<WarehouseInventorySummary>>;

    /// 按库存行明细查询
    async fn get_inventory_type_components(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<TypeComponentStock>>;
}
