//! 库存台账命令

use common::UserId;
use errors::{AppError, AppResult};

use crate::domain::value_objects::{ComponentId, TypeComponentId, WarehouseId};

/// 登记仓库命令
#[derive(Debug, Clone)]
pub struct RegisterWarehouseCommand {
    pub user_id: UserId,
    pub code: String,
    pub name: String,
    /// 数字越小优先级越高
    pub priority: i32,
}

impl RegisterWarehouseCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.code.trim().is_empty() {
            return Err(AppError::validation("仓库编码不能为空"));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation("仓库名称不能为空"));
        }
        Ok(())
    }
}

/// 入库命令（采购入库/人工调整）
///
/// 给出序列号时按件登记物理配件，序列号数量必须与入库量一致。
#[derive(Debug, Clone)]
pub struct StockIntakeCommand {
    pub user_id: UserId,
    pub warehouse_id: WarehouseId,
    pub type_component_id: TypeComponentId,
    pub quantity: i64,
    pub serial_numbers: Vec<String>,
    pub reason: String,
}

impl StockIntakeCommand {
    pub fn validate(&self) -> AppResult<()> {
        if self.quantity <= 0 {
            return Err(AppError::invalid_quantity(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if !self.serial_numbers.is_empty() && self.serial_numbers.len() as i64 != self.quantity {
            return Err(AppError::validation(format!(
                "序列号数量 {} 与入库量 {} 不一致",
                self.serial_numbers.len(),
                self.quantity
            )));
        }
        if self.reason.trim().is_empty() {
            return Err(AppError::validation("入库原因不能为空"));
        }
        Ok(())
    }
}

/// 配件退回命令（缺陷件/撤回）
#[derive(Debug, Clone)]
pub struct ReturnComponentCommand {
    pub user_id: UserId,
    pub component_id: ComponentId,
    /// 退回接收仓
    pub warehouse_id: WarehouseId,
}
