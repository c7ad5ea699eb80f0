//! 仓储接口模块

mod inventory_query_repository;

pub use inventory_query_repository::{
    InventoryFilter, InventoryQueryRepository, TypeComponentStock, WarehouseInventorySummary,
};
