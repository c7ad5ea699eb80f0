//! 车辆 VIN 值对象

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// VIN 固定长度
const VIN_LENGTH: usize = 17;

/// VIN 错误
#[derive(Debug, Error)]
pub enum VinError {
    #[error("VIN 不能为空")]
    Empty,
    #[error("VIN 长度必须为 {VIN_LENGTH} 个字符")]
    WrongLength,
    #[error("VIN 包含无效字符: {0}")]
    InvalidCharacter(char),
}

/// 车辆 VIN 值对象
///
/// 业务规则:
/// - 固定 17 字符
/// - 只允许字母数字，且不含 I/O/Q（ISO 3779）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vin(String);

impl Vin {
    /// 创建新的 VIN
    pub fn new(vin: impl Into<String>) -> Result<Self, VinError> {
        let vin = vin.into().trim().to_uppercase();

        if vin.is_empty() {
            return Err(VinError::Empty);
        }

        if vin.len() != VIN_LENGTH {
            return Err(VinError::WrongLength);
        }

        for c in vin.chars() {
            if !c.is_ascii_alphanumeric() || matches!(c, 'I' | 'O' | 'Q') {
                return Err(VinError::InvalidCharacter(c));
            }
        }

        Ok(Self(vin))
    }

    /// 获取 VIN 字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 转换为字符串
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Vin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Vin {
    type Error = VinError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_vin() {
        let vin = Vin::new("wvgzzz5nzjw410329").unwrap();
        assert_eq!(vin.as_str(), "WVGZZZ5NZJW410329");
    }

    #[test]
    fn test_wrong_length() {
        assert!(matches!(Vin::new("ABC123"), Err(VinError::WrongLength)));
    }

    #[test]
    fn test_forbidden_letter() {
        let result = Vin::new("WVGZZZ5NZJW41032O");
        assert!(matches!(result, Err(VinError::InvalidCharacter('O'))));
    }
}
