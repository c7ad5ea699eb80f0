//! 任务类型枚举

use serde::{Deserialize, Serialize};

/// 技师任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// 诊断
    Diagnosis,
    /// 维修
    Repair,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Diagnosis => "DIAGNOSIS",
            TaskType::Repair => "REPAIR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DIAGNOSIS" => Some(TaskType::Diagnosis),
            "REPAIR" => Some(TaskType::Repair),
            _ => None,
        }
    }
}
