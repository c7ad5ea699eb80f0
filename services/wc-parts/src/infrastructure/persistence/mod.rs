//! 持久化层：PostgreSQL 与内存两套工作单元实现

pub mod converters;
pub mod memory;
pub mod pg_unit_of_work;
pub mod postgres;
pub mod rows;

pub use memory::{MemoryInventoryQueryRepository, MemoryStore};
pub use pg_unit_of_work::{PgUnitOfWork, PgUnitOfWorkFactory};
pub use postgres::{connect_pool, PostgresInventoryQueryRepository};
