//! 领域层
//!
//! 包含实体、值对象、枚举、领域事件、仓储接口和工作单元

pub mod entities;
pub mod enums;
pub mod events;
pub mod repositories;
pub mod unit_of_work;
pub mod value_objects;

pub use entities::*;
pub use enums::*;
pub use events::*;
pub use repositories::*;
pub use unit_of_work::*;
pub use value_objects::*;
