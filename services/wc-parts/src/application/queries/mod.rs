//! 查询对象定义

pub mod inventory_queries;

pub use inventory_queries::*;
