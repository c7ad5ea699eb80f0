//! 基础设施层：持久化与通知派发

pub mod notify;
pub mod persistence;

pub use notify::TracingNotifier;
