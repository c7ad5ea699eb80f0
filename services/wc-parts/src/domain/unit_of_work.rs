//! Unit of Work 模式
//!
//! 提供跨多个聚合的事务协调能力。每个入站操作是一个独立的
//! 工作单元：守卫检查先于任何变更，失败即整体回滚，不存在
//! 可观测的部分完成。库存行的读取一律是锁定读
//! （Postgres 行锁 / 内存实现的互斥串行化），保证同一库存行上
//! 并发的 reserve/release/consume 按某个全序串行。
//!
//! # 使用示例
//!
//! ```ignore
//! let mut uow = uow_factory.begin().await?;
//! let mut line = uow.lock_stock_line(warehouse_id, type_component_id).await?;
//! line.reserve(qty)?;
//! uow.save_stock_line(&line).await?;
//! uow.commit().await?;
//! ```

use async_trait::async_trait;
use errors::AppResult;

use crate::domain::entities::{
    CaseLine, Component, GuaranteeCase, Reservation, StockCandidate, StockLine, StockReservation,
    StockTransferRequest, TaskAssignment, Warehouse,
};
use crate::domain::enums::TaskType;
use crate::domain::value_objects::{
    CaseLineId, ComponentId, GuaranteeCaseId, ReservationId, SerialNumber, TaskAssignmentId,
    TransferRequestId, TypeComponentId, WarehouseId,
};

/// Unit of Work trait
///
/// 所有写路径与锁定读都经由这里。`save_*` 为 upsert 语义。
#[async_trait]
pub trait UnitOfWork: Send {
    // ========== 仓库 ==========

    async fn get_warehouse(&mut self, id: WarehouseId) -> AppResult<Warehouse>;

    async fn find_warehouse_by_code(&mut self, code: &str) -> AppResult<Option<Warehouse>>;

    async fn save_warehouse(&mut self, warehouse: &Warehouse) -> AppResult<()>;

    // ========== 库存行（锁定读） ==========

    /// 锁定读取库存行；不存在时返回 NotFound
    async fn lock_stock_line(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
    ) -> AppResult<StockLine>;

    /// 锁定读取库存行；不存在时创建零量行（入库/收货路径）
    async fn lock_or_create_stock_line(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
    ) -> AppResult<StockLine>;

    async fn save_stock_line(&mut self, line: &StockLine) -> AppResult<()>;

    /// 列出可满足某配件类型的候选源仓（锁定读，已按策略排序）
    async fn list_stock_candidates(
        &mut self,
        type_component_id: TypeComponentId,
        exclude_warehouse: Option<WarehouseId>,
    ) -> AppResult<Vec<StockCandidate>>;

    // ========== 预留 ==========

    async fn get_reservation(&mut self, id: ReservationId) -> AppResult<Reservation>;

    async fn save_reservation(&mut self, reservation: &Reservation) -> AppResult<()>;

    async fn reservations_for_case_line(
        &mut self,
        case_line_id: CaseLineId,
    ) -> AppResult<Vec<Reservation>>;

    async fn stock_reservations_for_request(
        &mut self,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<Vec<StockReservation>>;

    async fn save_stock_reservation(&mut self, reservation: &StockReservation) -> AppResult<()>;

    // ========== 调拨申请 ==========

    async fn get_transfer_request(
        &mut self,
        id: TransferRequestId,
    ) -> AppResult<StockTransferRequest>;

    async fn save_transfer_request(&mut self, request: &StockTransferRequest) -> AppResult<()>;

    // ========== 物理配件 ==========

    async fn get_component(&mut self, id: ComponentId) -> AppResult<Component>;

    async fn find_component_by_serial(
        &mut self,
        serial: &SerialNumber,
    ) -> AppResult<Option<Component>>;

    async fn save_component(&mut self, component: &Component) -> AppResult<()>;

    /// 锁定选取某仓某类型的可用配件（最多 `count` 件）
    async fn take_available_components(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        count: i64,
    ) -> AppResult<Vec<Component>>;

    async fn components_for_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> AppResult<Vec<Component>>;

    async fn components_for_transfer(
        &mut self,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<Vec<Component>>;

    // ========== 工单行 / 保修工单 ==========

    async fn get_case_line(&mut self, id: CaseLineId) -> AppResult<CaseLine>;

    async fn save_case_line(&mut self, case_line: &CaseLine) -> AppResult<()>;

    async fn case_lines_for_case(&mut self, case_id: GuaranteeCaseId) -> AppResult<Vec<CaseLine>>;

    async fn get_guarantee_case(&mut self, id: GuaranteeCaseId) -> AppResult<GuaranteeCase>;

    async fn save_guarantee_case(&mut self, case: &GuaranteeCase) -> AppResult<()>;

    // ========== 任务指派 ==========

    async fn get_task_assignment(&mut self, id: TaskAssignmentId) -> AppResult<TaskAssignment>;

    /// 当前活跃指派（每工单行每任务类型至多一条）
    async fn active_task_assignment(
        &mut self,
        case_line_id: CaseLineId,
        task_type: TaskType,
    ) -> AppResult<Option<TaskAssignment>>;

    async fn save_task_assignment(&mut self, assignment: &TaskAssignment) -> AppResult<()>;

    // ========== 事务终结 ==========

    /// 提交事务
    ///
    /// 成功时所有更改持久化，失败时自动回滚。
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
