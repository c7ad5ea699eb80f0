//! 领域事件模块

mod parts_events;

pub use parts_events::{EventMetadata, PartsEvent};
