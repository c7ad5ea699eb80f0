//! 状态枚举模块
//!
//! 每个状态机一个封闭和类型，非法状态不可表示，
//! 转换函数由编译器穷尽检查。

mod case_line_status;
mod component_status;
mod reservation_status;
mod task_type;
mod transfer_status;

pub use case_line_status::{CaseLineStatus, GuaranteeCaseStatus, WarrantyStatus};
pub use component_status::ComponentStatus;
pub use reservation_status::{ReservationStatus, StockReservationStatus};
pub use task_type::TaskType;
pub use transfer_status::TransferStatus;
