//! 仓库实体

use common::AuditInfo;
use domain_core::{AggregateRoot, Entity};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::WarehouseId;

/// 仓库
///
/// `priority` 数字越小优先级越高，用于缺口调拨时的源仓排序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    code: String,
    name: String,
    priority: i32,
    audit_info: AuditInfo,
}

impl Warehouse {
    /// 创建新仓库
    pub fn new(code: impl Into<String>, name: impl Into<String>, priority: i32) -> Self {
        Self {
            id: WarehouseId::new(),
            code: code.into(),
            name: name.into(),
            priority,
            audit_info: AuditInfo::default(),
        }
    }

    /// 从各部分构建（用于从数据库加载）
    pub fn from_parts(
        id: WarehouseId,
        code: String,
        name: String,
        priority: i32,
        audit_info: AuditInfo,
    ) -> Self {
        Self {
            id,
            code,
            name,
            priority,
            audit_info,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &WarehouseId {
        &self.id
    }
}

impl AggregateRoot for Warehouse {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit_info
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit_info
    }
}
