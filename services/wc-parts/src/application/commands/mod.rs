//! 命令对象定义

pub mod assignment_commands;
pub mod case_line_commands;
pub mod inventory_commands;
pub mod reservation_commands;
pub mod transfer_commands;

pub use assignment_commands::*;
pub use case_line_commands::*;
pub use inventory_commands::*;
pub use reservation_commands::*;
pub use transfer_commands::*;
