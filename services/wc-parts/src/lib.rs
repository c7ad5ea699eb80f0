//! wc-parts - 保修工单配件预留与履约引擎
//!
//! 覆盖库存台账、配件预留、跨仓调拨、工单行/配件生命周期
//! 与任务指派。传输层（gRPC/HTTP 路由）由外部协作方承担，
//! 本 crate 以 application handler 为对外边界。

pub mod application;
pub mod domain;
pub mod infrastructure;
