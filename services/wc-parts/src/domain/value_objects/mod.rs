//! 值对象模块

mod custody;
mod ids;
mod serial_number;
mod vin;

pub use custody::Custody;
pub use ids::{
    CaseLineId, ComponentId, GuaranteeCaseId, ReservationId, StockLineId, StockReservationId,
    TaskAssignmentId, TransferItemId, TransferRequestId, TypeComponentId, WarehouseId,
};
pub use serial_number::{SerialNumber, SerialNumberError};
pub use vin::{Vin, VinError};
