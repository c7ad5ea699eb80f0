//! PostgreSQL 连接池与只读查询仓储

use async_trait::async_trait;
use common::types::{PagedResult, Pagination};
use config::DatabaseConfig;
use errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::domain::repositories::{
    InventoryFilter, InventoryQueryRepository, TypeComponentStock, WarehouseInventorySummary,
};
use crate::domain::value_objects::{TypeComponentId, WarehouseId};

use super::rows::{InventorySummaryRow, TypeComponentStockRow};

/// 按配置建立连接池
pub async fn connect_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| AppError::database(format!("数据库连接失败: {}", e)))
}

/// 面板只读路径，走快照读不占行锁
pub struct PostgresInventoryQueryRepository {
    pool: PgPool,
}

impl PostgresInventoryQueryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryQueryRepository for PostgresInventoryQueryRepository {
    async fn get_inventory_summary(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<WarehouseInventorySummary>> {
        let warehouse_id = filter.warehouse_id.map(|w| w.0);
        let type_component_id = filter.type_component_id.map(|t| t.0);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT warehouse_id)
            FROM stock_lines
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::uuid IS NULL OR type_component_id = $2)
            "#,
        )
        .bind(warehouse_id)
        .bind(type_component_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("库存汇总计数失败: {}", e)))?;

        let rows = sqlx::query_as::<_, InventorySummaryRow>(
            r#"
            SELECT warehouse_id,
                   COALESCE(SUM(quantity_in_stock), 0) AS total_in_stock,
                   COALESCE(SUM(quantity_reserved), 0) AS total_reserved
            FROM stock_lines
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::uuid IS NULL OR type_component_id = $2)
            GROUP BY warehouse_id
            ORDER BY warehouse_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(warehouse_id)
        .bind(type_component_id)
        .bind(pagination.page_size as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("库存汇总查询失败: {}", e)))?;

        let items = rows
            .into_iter()
            .map(|row| WarehouseInventorySummary {
                warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
                total_in_stock: row.total_in_stock,
                total_reserved: row.total_reserved,
                total_available: row.total_in_stock - row.total_reserved,
            })
            .collect();
        Ok(PagedResult::new(items, total as u64, &pagination))
    }

    async fn get_inventory_type_components(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<TypeComponentStock>> {
        let warehouse_id = filter.warehouse_id.map(|w| w.0);
        let type_component_id = filter.type_component_id.map(|t| t.0);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM stock_lines
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::uuid IS NULL OR type_component_id = $2)
            "#,
        )
        .bind(warehouse_id)
        .bind(type_component_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("库存明细计数失败: {}", e)))?;

        let rows = sqlx::query_as::<_, TypeComponentStockRow>(
            r#"
            SELECT warehouse_id, type_component_id, quantity_in_stock, quantity_reserved
            FROM stock_lines
            WHERE ($1::uuid IS NULL OR warehouse_id = $1)
              AND ($2::uuid IS NULL OR type_component_id = $2)
            ORDER BY warehouse_id, type_component_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(warehouse_id)
        .bind(type_component_id)
        .bind(pagination.page_size as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("库存明细查询失败: {}", e)))?;

        let items = rows
            .into_iter()
            .map(|row| TypeComponentStock {
                warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
                type_component_id: TypeComponentId::from_uuid(row.type_component_id),
                quantity_in_stock: row.quantity_in_stock,
                quantity_reserved: row.quantity_reserved,
                quantity_available: row.quantity_in_stock - row.quantity_reserved,
            })
            .collect();
        Ok(PagedResult::new(items, total as u64, &pagination))
    }
}
