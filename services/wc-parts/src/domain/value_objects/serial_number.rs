//! 配件序列号值对象

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 序列号最大长度
const MAX_LENGTH: usize = 64;

/// 序列号错误
#[derive(Debug, Error)]
pub enum SerialNumberError {
    #[error("序列号不能为空")]
    Empty,
    #[error("序列号长度不能超过 {MAX_LENGTH} 个字符")]
    TooLong,
    #[error("序列号包含无效字符: {0}")]
    InvalidCharacter(char),
}

/// 配件序列号值对象
///
/// 每个物理配件唯一。业务规则:
/// - 不能为空
/// - 最大长度 64 字符
/// - 只允许字母、数字、连字符和下划线
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerialNumber(String);

impl SerialNumber {
    /// 创建新的序列号
    pub fn new(serial: impl Into<String>) -> Result<Self, SerialNumberError> {
        let serial = serial.into().trim().to_uppercase();

        if serial.is_empty() {
            return Err(SerialNumberError::Empty);
        }

        if serial.len() > MAX_LENGTH {
            return Err(SerialNumberError::TooLong);
        }

        for c in serial.chars() {
            if !c.is_alphanumeric() && c != '-' && c != '_' {
                return Err(SerialNumberError::InvalidCharacter(c));
            }
        }

        Ok(Self(serial))
    }

    /// 获取序列号字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 转换为字符串
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for SerialNumber {
    type Error = SerialNumberError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
