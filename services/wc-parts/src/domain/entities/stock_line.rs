//! 库存行聚合根
//!
//! (仓库, 配件类型) 维度的在库/预留数量唯一事实来源。
//! 两个计数只能通过台账操作调整，任何直写都视为缺陷。

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{StockLineId, TypeComponentId, WarehouseId};

/// 库存行聚合根
///
/// 不变量：`0 <= quantity_reserved <= quantity_in_stock`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLine {
    id: StockLineId,
    warehouse_id: WarehouseId,
    type_component_id: TypeComponentId,
    quantity_in_stock: i64,
    quantity_reserved: i64,
    audit_info: AuditInfo,
}

/// 缺口调拨的候选源仓
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCandidate {
    pub warehouse_id: WarehouseId,
    pub warehouse_priority: i32,
    pub stock_line: StockLine,
}

impl StockCandidate {
    /// 按优先级升序、可用量降序排序候选源仓
    ///
    /// 两个持久化实现共用同一排序，保证选仓结果一致。
    pub fn rank(candidates: &mut [StockCandidate]) {
        candidates.sort_by(|a, b| {
            a.warehouse_priority
                .cmp(&b.warehouse_priority)
                .then(b.stock_line.quantity_available().cmp(&a.stock_line.quantity_available()))
        });
    }
}

impl StockLine {
    /// 创建空库存行（首次入库时）
    pub fn new(warehouse_id: WarehouseId, type_component_id: TypeComponentId) -> Self {
        Self {
            id: StockLineId::new(),
            warehouse_id,
            type_component_id,
            quantity_in_stock: 0,
            quantity_reserved: 0,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: StockLineId,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        quantity_in_stock: i64,
        quantity_reserved: i64,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            warehouse_id,
            type_component_id,
            quantity_in_stock,
            quantity_reserved,
            audit_info,
        }
    }

    // ========== Getters ==========

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn type_component_id(&self) -> TypeComponentId {
        self.type_component_id
    }

    pub fn quantity_in_stock(&self) -> i64 {
        self.quantity_in_stock
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    /// 可用量 = 在库量 - 预留量
    pub fn quantity_available(&self) -> i64 {
        self.quantity_in_stock - self.quantity_reserved
    }

    // ========== 台账操作 ==========

    /// 入库：提高在库量（采购入库、调拨收货、人工调整）
    pub fn increase(&mut self, qty: i64) -> AppResult<()> {
        Self::check_positive(qty)?;
        self.quantity_in_stock += qty;
        self.check_invariants()
    }

    /// 预留：可用量足够时提高预留量，否则整单失败并报告实际可用量
    pub fn reserve(&mut self, qty: i64) -> AppResult<()> {
        Self::check_positive(qty)?;
        let available = self.quantity_available();
        if available < qty {
            return Err(AppError::InsufficientStock {
                requested: qty,
                available,
            });
        }
        self.quantity_reserved += qty;
        self.check_invariants()
    }

    /// 释放预留
    ///
    /// 预留量降为负说明调用方记账出错，按不变量违规处理。
    pub fn release(&mut self, qty: i64) -> AppResult<()> {
        Self::check_positive(qty)?;
        if qty > self.quantity_reserved {
            return Err(AppError::invariant_violation(format!(
                "release of {} exceeds quantity_reserved {} on stock line {}",
                qty, self.quantity_reserved, self.id
            )));
        }
        self.quantity_reserved -= qty;
        self.check_invariants()
    }

    /// 消耗：预留库存被实际领用/发运时同时扣减两个计数
    pub fn consume(&mut self, qty: i64) -> AppResult<()> {
        Self::check_positive(qty)?;
        if qty > self.quantity_reserved {
            return Err(AppError::invariant_violation(format!(
                "consume of {} exceeds quantity_reserved {} on stock line {}",
                qty, self.quantity_reserved, self.id
            )));
        }
        self.quantity_in_stock -= qty;
        self.quantity_reserved -= qty;
        self.check_invariants()
    }

    fn check_positive(qty: i64) -> AppResult<()> {
        if qty <= 0 {
            return Err(AppError::invalid_quantity(format!(
                "quantity must be positive, got {}",
                qty
            )));
        }
        Ok(())
    }

    /// 不变量检查：`0 <= quantity_reserved <= quantity_in_stock`
    pub fn check_invariants(&self) -> AppResult<()> {
        if self.quantity_reserved < 0 || self.quantity_reserved > self.quantity_in_stock {
            return Err(AppError::invariant_violation(format!(
                "stock line {} out of bounds: in_stock={}, reserved={}",
                self.id, self.quantity_in_stock, self.quantity_reserved
            )));
        }
        Ok(())
    }
}

impl Entity for StockLine {
    type Id = StockLineId;

    fn id(&self) -> &StockLineId {
        &self.id
    }
}

impl AggregateRoot for StockLine {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
