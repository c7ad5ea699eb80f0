//! 库存台账处理器
//!
//! 仓库登记、入库、配件退回与只读库存查询。

use std::sync::Arc;

use common::retry::retry_once;
use common::types::PagedResult;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use tracing::info;

use crate::domain::entities::{Component, StockLine, Warehouse};
use crate::domain::repositories::{
    InventoryFilter, InventoryQueryRepository, TypeComponentStock, WarehouseInventorySummary,
};
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::domain::value_objects::SerialNumber;

use crate::application::commands::*;
use crate::application::queries::*;

pub struct InventoryHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    query_repo: Arc<dyn InventoryQueryRepository>,
}

impl InventoryHandler {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        query_repo: Arc<dyn InventoryQueryRepository>,
    ) -> Self {
        Self {
            uow_factory,
            query_repo,
        }
    }

    // ========== 仓库 ==========

    /// 登记仓库；编码全局唯一
    pub async fn register_warehouse(&self, cmd: RegisterWarehouseCommand) -> AppResult<Warehouse> {
        cmd.validate()?;
        let mut uow = self.uow_factory.begin().await?;

        if uow.find_warehouse_by_code(&cmd.code).await?.is_some() {
            return Err(AppError::conflict(format!("仓库编码 {} 已存在", cmd.code)));
        }

        let mut warehouse = Warehouse::new(&cmd.code, &cmd.name, cmd.priority);
        warehouse.audit_info_mut().created_by = Some(cmd.user_id);
        uow.save_warehouse(&warehouse).await?;
        uow.commit().await?;

        info!("Warehouse {} registered with code {}", warehouse.id(), cmd.code);
        Ok(warehouse)
    }

    // ========== 入库 ==========

    /// 入库：台账加量，序列化配件按件登记
    pub async fn stock_intake(&self, cmd: StockIntakeCommand) -> AppResult<StockLine> {
        cmd.validate()?;
        super::trace_invariant(retry_once(|| self.intake_inner(&cmd), AppError::is_retryable).await)
    }

    async fn intake_inner(&self, cmd: &StockIntakeCommand) -> AppResult<StockLine> {
        let mut uow = self.uow_factory.begin().await?;

        uow.get_warehouse(cmd.warehouse_id).await?;
        let mut line = uow
            .lock_or_create_stock_line(cmd.warehouse_id, cmd.type_component_id)
            .await?;
        line.increase(cmd.quantity)?;
        uow.save_stock_line(&line).await?;

        for raw_serial in &cmd.serial_numbers {
            let serial = SerialNumber::new(raw_serial.clone())
                .map_err(|e| AppError::validation(e.to_string()))?;
            if uow.find_component_by_serial(&serial).await?.is_some() {
                return Err(AppError::conflict(format!("序列号 {} 已登记", raw_serial)));
            }
            let mut component =
                Component::register(cmd.type_component_id, serial, cmd.warehouse_id);
            component.audit_info_mut().created_by = Some(cmd.user_id);
            uow.save_component(&component).await?;
        }

        uow.commit().await?;

        metrics::counter!("parts_stock_intake_total").increment(cmd.quantity as u64);
        info!(
            "Stock intake at warehouse {}: {} x {} ({})",
            cmd.warehouse_id, cmd.quantity, cmd.type_component_id, cmd.reason
        );
        Ok(line)
    }

    // ========== 配件退回 ==========

    /// 缺陷件/拆回件退回仓库封存，不回流可用量
    pub async fn return_component(&self, cmd: ReturnComponentCommand) -> AppResult<Component> {
        retry_once(|| self.return_inner(&cmd), AppError::is_retryable).await
    }

    async fn return_inner(&self, cmd: &ReturnComponentCommand) -> AppResult<Component> {
        let mut uow = self.uow_factory.begin().await?;

        uow.get_warehouse(cmd.warehouse_id).await?;
        let mut component = uow.get_component(cmd.component_id).await?;
        component.return_to_warehouse(cmd.warehouse_id)?;
        component.audit_info_mut().update(Some(cmd.user_id));
        uow.save_component(&component).await?;
        uow.commit().await?;

        info!(
            "Component {} returned to warehouse {}",
            cmd.component_id, cmd.warehouse_id
        );
        Ok(component)
    }

    // ========== 查询 ==========

    /// 仓库三量汇总（在手/预留/可用）
    pub async fn inventory_summary(
        &self,
        query: InventorySummaryQuery,
    ) -> AppResult<PagedResult<WarehouseInventorySummary>> {
        let filter = InventoryFilter {
            warehouse_id: query.warehouse_id,
            type_component_id: query.type_component_id,
        };
        self.query_repo
            .get_inventory_summary(filter, query.pagination)
            .await
    }

    /// 仓库分件型库存明细
    pub async fn inventory_type_components(
        &self,
        query: InventoryTypeComponentsQuery,
    ) -> AppResult<PagedResult<TypeComponentStock>> {
        let filter = InventoryFilter {
            warehouse_id: query.warehouse_id,
            type_component_id: query.type_component_id,
        };
        self.query_repo
            .get_inventory_type_components(filter, query.pagination)
            .await
    }
}
