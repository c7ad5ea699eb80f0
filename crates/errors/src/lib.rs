//! volta-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范。
//! 错误分两类：业务规则失败（调用方可恢复）与 InvariantViolation
//! （调用方或数据缺陷，永远不静默修正，对外只暴露通用失败）。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// 数量非法（非正数或格式错误）
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// 预留超出可用量。携带实际可用量，调用方可据此开立调拨申请
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// 状态机守卫失败，调用方可改选合法动作
    #[error("Invalid state transition: {entity} cannot {action} from {from}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    /// 预留不处于可领取状态
    #[error("Reservation not pickable: {0}")]
    ReservationNotPickable(String),

    /// 任务已完成
    #[error("Already completed: {0}")]
    AlreadyCompleted(String),

    /// 防御性检查失败。说明存在调用方或数据缺陷，总是致命
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 事务串行化冲突，调用方应重试一次
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn not_pickable(msg: impl Into<String>) -> Self {
        Self::ReservationNotPickable(msg.into())
    }

    pub fn already_completed(msg: impl Into<String>) -> Self {
        Self::AlreadyCompleted(msg.into())
    }

    pub fn invariant_violation(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_transition(entity: &'static str, from: impl Into<String>, action: &'static str) -> Self {
        Self::InvalidStateTransition {
            entity,
            from: from.into(),
            action,
        }
    }

    /// 是否可通过重试一次恢复（串行化冲突）
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict(_))
    }

    /// 是否为不变量违规（需要运维关注的缺陷信号）
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::InvalidQuantity(_) => 400,
            Self::InsufficientStock { .. } => 409,
            Self::InvalidStateTransition { .. } => 409,
            Self::ReservationNotPickable(_) => 412,
            Self::AlreadyCompleted(_) => 412,
            Self::InvariantViolation(_) => 500,
            Self::Conflict(_) => 409,
            Self::TransactionConflict(_) => 409,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    ///
    /// InvariantViolation 不携带账目细节，对外只给出通用失败。
    pub fn to_problem_details(&self) -> ProblemDetails {
        let detail = match self {
            Self::InvariantViolation(_) => "An internal consistency error occurred".to_string(),
            other => other.to_string(),
        };
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail,
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::InvalidQuantity(_) => "invalid-quantity",
            Self::InsufficientStock { .. } => "insufficient-stock",
            Self::InvalidStateTransition { .. } => "invalid-state-transition",
            Self::ReservationNotPickable(_) => "reservation-not-pickable",
            Self::AlreadyCompleted(_) => "already-completed",
            Self::InvariantViolation(_) => "internal",
            Self::Conflict(_) => "conflict",
            Self::TransactionConflict(_) => "transaction-conflict",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        };
        format!("https://api.volta-ev.example/problems/{}", slug)
    }

    fn problem_title(&self) -> String {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::InvalidQuantity(_) => "Invalid Quantity",
            Self::InsufficientStock { .. } => "Insufficient Stock",
            Self::InvalidStateTransition { .. } => "Invalid State Transition",
            Self::ReservationNotPickable(_) => "Reservation Not Pickable",
            Self::AlreadyCompleted(_) => "Already Completed",
            Self::InvariantViolation(_) => "Internal Server Error",
            Self::Conflict(_) => "Conflict",
            Self::TransactionConflict(_) => "Transaction Conflict",
            Self::Database(_) => "Database Error",
            Self::Internal(_) => "Internal Server Error",
        }
        .to_string()
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
