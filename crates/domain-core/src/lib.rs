//! domain-core - 跨 context 的领域核心类型

// Re-export common types
pub use common::{AuditInfo, UserId};

/// 实体 trait
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

/// 聚合根 trait
///
/// 聚合根额外承载审计信息，仓储层在装配与落库时读写。
pub trait AggregateRoot: Entity {
    fn audit_info(&self) -> &AuditInfo;
    fn audit_info_mut(&mut self) -> &mut AuditInfo;
}
