//! 内存工作单元实现
//!
//! 单进程部署与测试用：全量状态放在一把互斥锁后面，事务在暂存副本上
//! 修改，提交时整体写回，放弃则直接丢弃。互斥锁天然串行化所有事务。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::types::{PagedResult, Pagination};
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::entities::{
    CaseLine, Component, GuaranteeCase, Reservation, StockCandidate, StockLine, StockReservation,
    StockTransferRequest, TaskAssignment, Warehouse,
};
use crate::domain::enums::TaskType;
use crate::domain::repositories::{
    InventoryFilter, InventoryQueryRepository, TypeComponentStock, WarehouseInventorySummary,
};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::{
    CaseLineId, ComponentId, GuaranteeCaseId, ReservationId, SerialNumber, TaskAssignmentId,
    TransferRequestId, TypeComponentId, WarehouseId,
};

#[derive(Debug, Default, Clone)]
struct StoreInner {
    warehouses: HashMap<Uuid, Warehouse>,
    stock_lines: HashMap<Uuid, StockLine>,
    reservations: HashMap<Uuid, Reservation>,
    stock_reservations: HashMap<Uuid, StockReservation>,
    transfer_requests: HashMap<Uuid, StockTransferRequest>,
    components: HashMap<Uuid, Component>,
    case_lines: HashMap<Uuid, CaseLine>,
    guarantee_cases: HashMap<Uuid, GuaranteeCase>,
    task_assignments: HashMap<Uuid, TaskAssignment>,
}

/// 进程内存储，可克隆共享
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.inner.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreInner>,
    staged: StoreInner,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    // ========== 仓库 ==========

    async fn get_warehouse(&mut self, id: WarehouseId) -> AppResult<Warehouse> {
        self.staged
            .warehouses
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("仓库 {} 不存在", id)))
    }

    async fn find_warehouse_by_code(&mut self, code: &str) -> AppResult<Option<Warehouse>> {
        Ok(self
            .staged
            .warehouses
            .values()
            .find(|w| w.code() == code)
            .cloned())
    }

    async fn save_warehouse(&mut self, warehouse: &Warehouse) -> AppResult<()> {
        self.staged
            .warehouses
            .insert(warehouse.id().0, warehouse.clone());
        Ok(())
    }

    // ========== 库存行 ==========

    async fn lock_stock_line(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
    ) -> AppResult<StockLine> {
        self.staged
            .stock_lines
            .values()
            .find(|l| {
                l.warehouse_id() == warehouse_id && l.type_component_id() == type_component_id
            })
            .cloned()
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "仓库 {} 无件型 {} 的库存行",
                    warehouse_id, type_component_id
                ))
            })
    }

    async fn lock_or_create_stock_line(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
    ) -> AppResult<StockLine> {
        match self.lock_stock_line(warehouse_id, type_component_id).await {
            Ok(line) => Ok(line),
            Err(AppError::NotFound(_)) => {
                let line = StockLine::new(warehouse_id, type_component_id);
                self.save_stock_line(&line).await?;
                Ok(line)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_stock_line(&mut self, line: &StockLine) -> AppResult<()> {
        self.staged.stock_lines.insert(line.id().0, line.clone());
        Ok(())
    }

    async fn list_stock_candidates(
        &mut self,
        type_component_id: TypeComponentId,
        exclude_warehouse: Option<WarehouseId>,
    ) -> AppResult<Vec<StockCandidate>> {
        let mut candidates: Vec<StockCandidate> = self
            .staged
            .stock_lines
            .values()
            .filter(|l| {
                l.type_component_id() == type_component_id
                    && l.quantity_available() > 0
                    && Some(l.warehouse_id()) != exclude_warehouse
            })
            .filter_map(|l| {
                let warehouse = self.staged.warehouses.get(&l.warehouse_id().0)?;
                Some(StockCandidate {
                    warehouse_id: l.warehouse_id(),
                    warehouse_priority: warehouse.priority(),
                    stock_line: l.clone(),
                })
            })
            .collect();
        StockCandidate::rank(&mut candidates);
        Ok(candidates)
    }

    // ========== 预留 ==========

    async fn get_reservation(&mut self, id: ReservationId) -> AppResult<Reservation> {
        self.staged
            .reservations
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("预留 {} 不存在", id)))
    }

    async fn save_reservation(&mut self, reservation: &Reservation) -> AppResult<()> {
        self.staged
            .reservations
            .insert(reservation.id().0, reservation.clone());
        Ok(())
    }

    async fn reservations_for_case_line(
        &mut self,
        case_line_id: CaseLineId,
    ) -> AppResult<Vec<Reservation>> {
        Ok(self
            .staged
            .reservations
            .values()
            .filter(|r| r.case_line_id() == case_line_id)
            .cloned()
            .collect())
    }

    async fn stock_reservations_for_request(
        &mut self,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<Vec<StockReservation>> {
        let item_ids: Vec<Uuid> = self
            .staged
            .transfer_requests
            .get(&transfer_request_id.0)
            .map(|r| r.items().iter().map(|i| i.id().0).collect())
            .unwrap_or_default();
        Ok(self
            .staged
            .stock_reservations
            .values()
            .filter(|sr| item_ids.contains(&sr.transfer_item_id().0))
            .cloned()
            .collect())
    }

    async fn save_stock_reservation(&mut self, reservation: &StockReservation) -> AppResult<()> {
        self.staged
            .stock_reservations
            .insert(reservation.id().0, reservation.clone());
        Ok(())
    }

    // ========== 调拨申请 ==========

    async fn get_transfer_request(
        &mut self,
        id: TransferRequestId,
    ) -> AppResult<StockTransferRequest> {
        self.staged
            .transfer_requests
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("调拨申请 {} 不存在", id)))
    }

    async fn save_transfer_request(&mut self, request: &StockTransferRequest) -> AppResult<()> {
        self.staged
            .transfer_requests
            .insert(request.id().0, request.clone());
        Ok(())
    }

    // ========== 物理配件 ==========

    async fn get_component(&mut self, id: ComponentId) -> AppResult<Component> {
        self.staged
            .components
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("配件 {} 不存在", id)))
    }

    async fn find_component_by_serial(
        &mut self,
        serial: &SerialNumber,
    ) -> AppResult<Option<Component>> {
        Ok(self
            .staged
            .components
            .values()
            .find(|c| c.serial_number() == serial)
            .cloned())
    }

    async fn save_component(&mut self, component: &Component) -> AppResult<()> {
        self.staged
            .components
            .insert(component.id().0, component.clone());
        Ok(())
    }

    async fn take_available_components(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        count: i64,
    ) -> AppResult<Vec<Component>> {
        let mut available: Vec<Component> = self
            .staged
            .components
            .values()
            .filter(|c| {
                c.type_component_id() == type_component_id
                    && c.status().is_available()
                    && c.custody().warehouse_id() == Some(warehouse_id)
            })
            .cloned()
            .collect();
        available.sort_by_key(|c| c.audit_info().created_at);
        available.truncate(count.max(0) as usize);
        Ok(available)
    }

    async fn components_for_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> AppResult<Vec<Component>> {
        Ok(self
            .staged
            .components
            .values()
            .filter(|c| c.reservation_id() == Some(reservation_id))
            .cloned()
            .collect())
    }

    async fn components_for_transfer(
        &mut self,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<Vec<Component>> {
        Ok(self
            .staged
            .components
            .values()
            .filter(|c| c.transfer_request_id() == Some(transfer_request_id))
            .cloned()
            .collect())
    }

    // ========== 工单行 / 保修工单 ==========

    async fn get_case_line(&mut self, id: CaseLineId) -> AppResult<CaseLine> {
        self.staged
            .case_lines
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("工单行 {} 不存在", id)))
    }

    async fn save_case_line(&mut self, case_line: &CaseLine) -> AppResult<()> {
        self.staged
            .case_lines
            .insert(case_line.id().0, case_line.clone());
        Ok(())
    }

    async fn case_lines_for_case(&mut self, case_id: GuaranteeCaseId) -> AppResult<Vec<CaseLine>> {
        let mut lines: Vec<CaseLine> = self
            .staged
            .case_lines
            .values()
            .filter(|l| l.guarantee_case_id() == case_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.audit_info().created_at);
        Ok(lines)
    }

    async fn get_guarantee_case(&mut self, id: GuaranteeCaseId) -> AppResult<GuaranteeCase> {
        self.staged
            .guarantee_cases
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("保修工单 {} 不存在", id)))
    }

    async fn save_guarantee_case(&mut self, case: &GuaranteeCase) -> AppResult<()> {
        self.staged
            .guarantee_cases
            .insert(case.id().0, case.clone());
        Ok(())
    }

    // ========== 任务指派 ==========

    async fn get_task_assignment(&mut self, id: TaskAssignmentId) -> AppResult<TaskAssignment> {
        self.staged
            .task_assignments
            .get(&id.0)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("任务指派 {} 不存在", id)))
    }

    async fn active_task_assignment(
        &mut self,
        case_line_id: CaseLineId,
        task_type: TaskType,
    ) -> AppResult<Option<TaskAssignment>> {
        Ok(self
            .staged
            .task_assignments
            .values()
            .find(|a| a.case_line_id() == case_line_id && a.task_type() == task_type && a.is_active())
            .cloned())
    }

    async fn save_task_assignment(&mut self, assignment: &TaskAssignment) -> AppResult<()> {
        self.staged
            .task_assignments
            .insert(assignment.id().0, assignment.clone());
        Ok(())
    }

    // ========== 事务边界 ==========

    async fn commit(mut self: Box<Self>) -> AppResult<()> {
        *self.guard = self.staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        // 丢弃暂存副本即可
        Ok(())
    }
}

/// 内存只读查询仓储
pub struct MemoryInventoryQueryRepository {
    store: MemoryStore,
}

impl MemoryInventoryQueryRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn paginate<T>(mut items: Vec<T>, pagination: &Pagination) -> PagedResult<T> {
    let total = items.len() as u64;
    let offset = pagination.offset() as usize;
    let items = if offset >= items.len() {
        Vec::new()
    } else {
        items
            .drain(offset..)
            .take(pagination.page_size as usize)
            .collect()
    };
    PagedResult::new(items, total, pagination)
}

#[async_trait]
impl InventoryQueryRepository for MemoryInventoryQueryRepository {
    async fn get_inventory_summary(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<WarehouseInventorySummary>> {
        let inner = self.store.inner.lock().await;
        let mut by_warehouse: HashMap<Uuid, (i64, i64)> = HashMap::new();
        for line in inner.stock_lines.values() {
            if let Some(w) = filter.warehouse_id {
                if line.warehouse_id() != w {
                    continue;
                }
            }
            if let Some(t) = filter.type_component_id {
                if line.type_component_id() != t {
                    continue;
                }
            }
            let entry = by_warehouse.entry(line.warehouse_id().0).or_default();
            entry.0 += line.quantity_in_stock();
            entry.1 += line.quantity_reserved();
        }
        let mut summaries: Vec<WarehouseInventorySummary> = by_warehouse
            .into_iter()
            .map(|(id, (in_stock, reserved))| WarehouseInventorySummary {
                warehouse_id: WarehouseId::from_uuid(id),
                total_in_stock: in_stock,
                total_reserved: reserved,
                total_available: in_stock - reserved,
            })
            .collect();
        summaries.sort_by_key(|s| s.warehouse_id.0);
        Ok(paginate(summaries, &pagination))
    }

    async fn get_inventory_type_components(
        &self,
        filter: InventoryFilter,
        pagination: Pagination,
    ) -> AppResult<PagedResult<TypeComponentStock>> {
        let inner = self.store.inner.lock().await;
        let mut details: Vec<TypeComponentStock> = inner
            .stock_lines
            .values()
            .filter(|l| {
                filter.warehouse_id.is_none_or(|w| l.warehouse_id() == w)
                    && filter
                        .type_component_id
                        .is_none_or(|t| l.type_component_id() == t)
            })
            .map(|l| TypeComponentStock {
                warehouse_id: l.warehouse_id(),
                type_component_id: l.type_component_id(),
                quantity_in_stock: l.quantity_in_stock(),
                quantity_reserved: l.quantity_reserved(),
                quantity_available: l.quantity_available(),
            })
            .collect();
        details.sort_by_key(|d| (d.warehouse_id.0, d.type_component_id.0));
        Ok(paginate(details, &pagination))
    }
}
