//! 应用层：命令、查询与业务处理器

pub mod commands;
pub mod handlers;
pub mod queries;

pub use handlers::{
    AssignmentHandler, CaseLineHandler, InventoryHandler, ReservationHandler, ReserveOutcome,
    TransferHandler,
};
