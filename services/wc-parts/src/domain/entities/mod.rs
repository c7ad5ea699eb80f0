//! 实体模块

mod case_line;
mod component;
mod reservation;
mod stock_line;
mod stock_transfer;
mod task_assignment;
mod warehouse;

pub use case_line::{CaseLine, GuaranteeCase};
pub use component::Component;
pub use reservation::{Reservation, StockReservation};
pub use stock_line::{StockCandidate, StockLine};
pub use stock_transfer::{StockTransferRequest, StockTransferRequestItem};
pub use task_assignment::TaskAssignment;
pub use warehouse::Warehouse;
