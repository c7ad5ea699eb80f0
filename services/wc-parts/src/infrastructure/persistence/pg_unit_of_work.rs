//! PostgreSQL 工作单元实现
//!
//! 每个工作单元持有一个 SERIALIZABLE 事务，锁定读用 SELECT ... FOR UPDATE；
//! 序列化冲突（40001/40P01）映射为可重试错误，由应用层重试一次。

use async_trait::async_trait;
use errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::entities::{
    CaseLine, Component, GuaranteeCase, Reservation, StockCandidate, StockLine, StockReservation,
    StockTransferRequest, TaskAssignment, Warehouse,
};
use crate::domain::enums::TaskType;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::{
    CaseLineId, ComponentId, GuaranteeCaseId, ReservationId, SerialNumber, TaskAssignmentId,
    TransferRequestId, TypeComponentId, WarehouseId,
};
use domain_core::{AggregateRoot, Entity};

use super::converters::*;
use super::rows::*;

/// 把 sqlx 错误映射到应用错误；序列化失败与死锁可重试
fn map_db_err(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if let Some(code) = db_err.code() {
            if code == "40001" || code == "40P01" {
                return AppError::TransactionConflict(db_err.message().to_string());
            }
            // 唯一约束冲突
            if code == "23505" {
                return AppError::conflict(db_err.message().to_string());
            }
        }
    }
    AppError::database(e.to_string())
}

pub struct PgUnitOfWorkFactory {
    pool: PgPool,
    lock_timeout_secs: u64,
}

impl PgUnitOfWorkFactory {
    pub fn new(pool: PgPool, lock_timeout_secs: u64) -> Self {
        Self {
            pool,
            lock_timeout_secs,
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        // SET 语句不支持参数绑定
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}s'",
            self.lock_timeout_secs
        ))
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    // ========== 仓库 ==========

    async fn get_warehouse(&mut self, id: WarehouseId) -> AppResult<Warehouse> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, code, name, priority, created_at, created_by, updated_at, updated_by
            FROM warehouses
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("仓库 {} 不存在", id)))?;
        Ok(warehouse_from_row(row))
    }

    async fn find_warehouse_by_code(&mut self, code: &str) -> AppResult<Option<Warehouse>> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, code, name, priority, created_at, created_by, updated_at, updated_by
            FROM warehouses
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(warehouse_from_row))
    }

    async fn save_warehouse(&mut self, warehouse: &Warehouse) -> AppResult<()> {
        let audit = warehouse.audit_info();
        sqlx::query(
            r#"
            INSERT INTO warehouses (id, code, name, priority, created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                priority = EXCLUDED.priority,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(warehouse.id().0)
        .bind(warehouse.code())
        .bind(warehouse.name())
        .bind(warehouse.priority())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    // ========== 库存行 ==========

    async fn lock_stock_line(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
    ) -> AppResult<StockLine> {
        let row = sqlx::query_as::<_, StockLineRow>(
            r#"
            SELECT id, warehouse_id, type_component_id, quantity_in_stock, quantity_reserved,
                   created_at, created_by, updated_at, updated_by
            FROM stock_lines
            WHERE warehouse_id = $1 AND type_component_id = $2
            FOR UPDATE
            "#,
        )
        .bind(warehouse_id.0)
        .bind(type_component_id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "仓库 {} 无件型 {} 的库存行",
                warehouse_id, type_component_id
            ))
        })?;
        Ok(stock_line_from_row(row))
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
                // 新插入的行在本事务内自然持有锁
                Ok(line)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_stock_line(&mut self, line: &StockLine) -> AppResult<()> {
        let audit = line.audit_info();
        sqlx::query(
            r#"
            INSERT INTO stock_lines (id, warehouse_id, type_component_id,
                                     quantity_in_stock, quantity_reserved,
                                     created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (warehouse_id, type_component_id) DO UPDATE SET
                quantity_in_stock = EXCLUDED.quantity_in_stock,
                quantity_reserved = EXCLUDED.quantity_reserved,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(line.id().0)
        .bind(line.warehouse_id().0)
        .bind(line.type_component_id().0)
        .bind(line.quantity_in_stock())
        .bind(line.quantity_reserved())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_stock_candidates(
        &mut self,
        type_component_id: TypeComponentId,
        exclude_warehouse: Option<WarehouseId>,
    ) -> AppResult<Vec<StockCandidate>> {
        let rows = sqlx::query_as::<_, StockCandidateRow>(
            r#"
            SELECT sl.id, sl.warehouse_id, sl.type_component_id,
                   sl.quantity_in_stock, sl.quantity_reserved,
                   sl.created_at, sl.created_by, sl.updated_at, sl.updated_by,
                   w.priority AS warehouse_priority
            FROM stock_lines sl
            JOIN warehouses w ON w.id = sl.warehouse_id
            WHERE sl.type_component_id = $1
              AND ($2::uuid IS NULL OR sl.warehouse_id <> $2)
              AND sl.quantity_in_stock - sl.quantity_reserved > 0
            ORDER BY w.priority ASC,
                     sl.quantity_in_stock - sl.quantity_reserved DESC
            FOR UPDATE OF sl
            "#,
        )
        .bind(type_component_id.0)
        .bind(exclude_warehouse.map(|w| w.0))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        let mut candidates: Vec<StockCandidate> = rows
            .into_iter()
            .map(|row| StockCandidate {
                warehouse_id: WarehouseId::from_uuid(row.warehouse_id),
                warehouse_priority: row.warehouse_priority,
                stock_line: stock_line_from_row(StockLineRow {
                    id: row.id,
                    warehouse_id: row.warehouse_id,
                    type_component_id: row.type_component_id,
                    quantity_in_stock: row.quantity_in_stock,
                    quantity_reserved: row.quantity_reserved,
                    created_at: row.created_at,
                    created_by: row.created_by,
                    updated_at: row.updated_at,
                    updated_by: row.updated_by,
                }),
            })
            .collect();
        StockCandidate::rank(&mut candidates);
        Ok(candidates)
    }

    // ========== 预留 ==========

    async fn get_reservation(&mut self, id: ReservationId) -> AppResult<Reservation> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, case_line_id, warehouse_id, type_component_id, quantity, status,
                   picked_by, picked_at, used_at, cancellation_reason,
                   created_at, created_by, updated_at, updated_by
            FROM reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("预留 {} 不存在", id)))?;
        reservation_from_row(row)
    }

    async fn save_reservation(&mut self, reservation: &Reservation) -> AppResult<()> {
        let audit = reservation.audit_info();
        sqlx::query(
            r#"
            INSERT INTO reservations (id, case_line_id, warehouse_id, type_component_id,
                                      quantity, status, picked_by, picked_at, used_at,
                                      cancellation_reason,
                                      created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                picked_by = EXCLUDED.picked_by,
                picked_at = EXCLUDED.picked_at,
                used_at = EXCLUDED.used_at,
                cancellation_reason = EXCLUDED.cancellation_reason,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(reservation.id().0)
        .bind(reservation.case_line_id().0)
        .bind(reservation.warehouse_id().0)
        .bind(reservation.type_component_id().0)
        .bind(reservation.quantity())
        .bind(reservation.status().as_str())
        .bind(reservation.picked_by().map(|u| u.0))
        .bind(reservation.picked_at())
        .bind(reservation.used_at())
        .bind(reservation.cancellation_reason())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn reservations_for_case_line(
        &mut self,
        case_line_id: CaseLineId,
    ) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, case_line_id, warehouse_id, type_component_id, quantity, status,
                   picked_by, picked_at, used_at, cancellation_reason,
                   created_at, created_by, updated_at, updated_by
            FROM reservations
            WHERE case_line_id = $1
            FOR UPDATE
            "#,
        )
        .bind(case_line_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(reservation_from_row).collect()
    }

    async fn stock_reservations_for_request(
        &mut self,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<Vec<StockReservation>> {
        let rows = sqlx::query_as::<_, StockReservationRow>(
            r#"
            SELECT sr.id, sr.transfer_item_id, sr.warehouse_id, sr.type_component_id,
                   sr.quantity_reserved, sr.status,
                   sr.created_at, sr.created_by, sr.updated_at, sr.updated_by
            FROM stock_reservations sr
            JOIN transfer_items ti ON ti.id = sr.transfer_item_id
            WHERE ti.transfer_request_id = $1
            FOR UPDATE OF sr
            "#,
        )
        .bind(transfer_request_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(stock_reservation_from_row).collect()
    }

    async fn save_stock_reservation(&mut self, reservation: &StockReservation) -> AppResult<()> {
        let audit = reservation.audit_info();
        sqlx::query(
            r#"
            INSERT INTO stock_reservations (id, transfer_item_id, warehouse_id,
                                            type_component_id, quantity_reserved, status,
                                            created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(reservation.id().0)
        .bind(reservation.transfer_item_id().0)
        .bind(reservation.warehouse_id().0)
        .bind(reservation.type_component_id().0)
        .bind(reservation.quantity_reserved())
        .bind(reservation.status().as_str())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    // ========== 调拨申请 ==========

    async fn get_transfer_request(
        &mut self,
        id: TransferRequestId,
    ) -> AppResult<StockTransferRequest> {
        let row = sqlx::query_as::<_, TransferRequestRow>(
            r#"
            SELECT id, requesting_warehouse_id, requested_by, status,
                   approved_by, approved_at, rejected_by, rejected_at, rejection_reason,
                   cancelled_by, cancelled_at, cancellation_reason,
                   shipped_at, received_by, received_at,
                   created_at, created_by, updated_at, updated_by
            FROM transfer_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("调拨申请 {} 不存在", id)))?;

        let item_rows = sqlx::query_as::<_, TransferItemRow>(
            r#"
            SELECT id, transfer_request_id, type_component_id,
                   quantity_requested, quantity_reserved, source_warehouse_id, case_line_id
            FROM transfer_items
            WHERE transfer_request_id = $1
            ORDER BY id
            "#,
        )
        .bind(id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        let items = item_rows.into_iter().map(transfer_item_from_row).collect();
        transfer_request_from_row(row, items)
    }

    async fn save_transfer_request(&mut self, request: &StockTransferRequest) -> AppResult<()> {
        let audit = request.audit_info();
        sqlx::query(
            r#"
            INSERT INTO transfer_requests (id, requesting_warehouse_id, requested_by, status,
                                           approved_by, approved_at,
                                           rejected_by, rejected_at, rejection_reason,
                                           cancelled_by, cancelled_at, cancellation_reason,
                                           shipped_at, received_by, received_at,
                                           created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                approved_by = EXCLUDED.approved_by,
                approved_at = EXCLUDED.approved_at,
                rejected_by = EXCLUDED.rejected_by,
                rejected_at = EXCLUDED.rejected_at,
                rejection_reason = EXCLUDED.rejection_reason,
                cancelled_by = EXCLUDED.cancelled_by,
                cancelled_at = EXCLUDED.cancelled_at,
                cancellation_reason = EXCLUDED.cancellation_reason,
                shipped_at = EXCLUDED.shipped_at,
                received_by = EXCLUDED.received_by,
                received_at = EXCLUDED.received_at,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(request.id().0)
        .bind(request.requesting_warehouse_id().0)
        .bind(request.requested_by().0)
        .bind(request.status().as_str())
        .bind(request.approved_by().map(|u| u.0))
        .bind(request.approved_at())
        .bind(request.rejected_by().map(|u| u.0))
        .bind(request.rejected_at())
        .bind(request.rejection_reason())
        .bind(request.cancelled_by().map(|u| u.0))
        .bind(request.cancelled_at())
        .bind(request.cancellation_reason())
        .bind(request.shipped_at())
        .bind(request.received_by().map(|u| u.0))
        .bind(request.received_at())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;

        for item in request.items() {
            sqlx::query(
                r#"
                INSERT INTO transfer_items (id, transfer_request_id, type_component_id,
                                            quantity_requested, quantity_reserved,
                                            source_warehouse_id, case_line_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO UPDATE SET
                    quantity_reserved = EXCLUDED.quantity_reserved,
                    source_warehouse_id = EXCLUDED.source_warehouse_id
                "#,
            )
            .bind(item.id().0)
            .bind(request.id().0)
            .bind(item.type_component_id().0)
            .bind(item.quantity_requested())
            .bind(item.quantity_reserved())
            .bind(item.source_warehouse_id().map(|w| w.0))
            .bind(item.case_line_id().map(|c| c.0))
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        }
        Ok(())
    }

    // ========== 物理配件 ==========

    async fn get_component(&mut self, id: ComponentId) -> AppResult<Component> {
        let row = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, type_component_id, serial_number, status, custody,
                   reservation_id, transfer_request_id, installed_at,
                   created_at, created_by, updated_at, updated_by
            FROM components
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("配件 {} 不存在", id)))?;
        component_from_row(row)
    }

    async fn find_component_by_serial(
        &mut self,
        serial: &SerialNumber,
    ) -> AppResult<Option<Component>> {
        let row = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, type_component_id, serial_number, status, custody,
                   reservation_id, transfer_request_id, installed_at,
                   created_at, created_by, updated_at, updated_by
            FROM components
            WHERE serial_number = $1
            "#,
        )
        .bind(serial.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        row.map(component_from_row).transpose()
    }

    async fn save_component(&mut self, component: &Component) -> AppResult<()> {
        let audit = component.audit_info();
        let custody = serde_json::to_value(component.custody())
            .map_err(|e| AppError::internal(format!("custody serialization failed: {}", e)))?;
        sqlx::query(
            r#"
            INSERT INTO components (id, type_component_id, serial_number, status, custody,
                                    reservation_id, transfer_request_id, installed_at,
                                    created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                custody = EXCLUDED.custody,
                reservation_id = EXCLUDED.reservation_id,
                transfer_request_id = EXCLUDED.transfer_request_id,
                installed_at = EXCLUDED.installed_at,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(component.id().0)
        .bind(component.type_component_id().0)
        .bind(component.serial_number().as_str())
        .bind(component.status().as_str())
        .bind(custody)
        .bind(component.reservation_id().map(|r| r.0))
        .bind(component.transfer_request_id().map(|t| t.0))
        .bind(component.installed_at())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn take_available_components(
        &mut self,
        warehouse_id: WarehouseId,
        type_component_id: TypeComponentId,
        count: i64,
    ) -> AppResult<Vec<Component>> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, type_component_id, serial_number, status, custody,
                   reservation_id, transfer_request_id, installed_at,
                   created_at, created_by, updated_at, updated_by
            FROM components
            WHERE type_component_id = $1
              AND status = 'IN_WAREHOUSE'
              AND custody->>'warehouse_id' = $2::text
            ORDER BY created_at
            LIMIT $3
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(type_component_id.0)
        .bind(warehouse_id.0)
        .bind(count)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(component_from_row).collect()
    }

    async fn components_for_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> AppResult<Vec<Component>> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, type_component_id, serial_number, status, custody,
                   reservation_id, transfer_request_id, installed_at,
                   created_at, created_by, updated_at, updated_by
            FROM components
            WHERE reservation_id = $1
            FOR UPDATE
            "#,
        )
        .bind(reservation_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(component_from_row).collect()
    }

    async fn components_for_transfer(
        &mut self,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<Vec<Component>> {
        let rows = sqlx::query_as::<_, ComponentRow>(
            r#"
            SELECT id, type_component_id, serial_number, status, custody,
                   reservation_id, transfer_request_id, installed_at,
                   created_at, created_by, updated_at, updated_by
            FROM components
            WHERE transfer_request_id = $1
            FOR UPDATE
            "#,
        )
        .bind(transfer_request_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(component_from_row).collect()
    }

    // ========== 工单行 / 保修工单 ==========

    async fn get_case_line(&mut self, id: CaseLineId) -> AppResult<CaseLine> {
        let row = sqlx::query_as::<_, CaseLineRow>(
            r#"
            SELECT id, guarantee_case_id, diagnosis_text, correction_text,
                   type_component_id, quantity_needed, warranty_status, status, technician_id,
                   created_at, created_by, updated_at, updated_by
            FROM case_lines
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("工单行 {} 不存在", id)))?;
        case_line_from_row(row)
    }

    async fn save_case_line(&mut self, case_line: &CaseLine) -> AppResult<()> {
        let audit = case_line.audit_info();
        sqlx::query(
            r#"
            INSERT INTO case_lines (id, guarantee_case_id, diagnosis_text, correction_text,
                                    type_component_id, quantity_needed, warranty_status,
                                    status, technician_id,
                                    created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                diagnosis_text = EXCLUDED.diagnosis_text,
                correction_text = EXCLUDED.correction_text,
                warranty_status = EXCLUDED.warranty_status,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(case_line.id().0)
        .bind(case_line.guarantee_case_id().0)
        .bind(case_line.diagnosis_text())
        .bind(case_line.correction_text())
        .bind(case_line.type_component_id().map(|t| t.0))
        .bind(case_line.quantity_needed())
        .bind(case_line.warranty_status().as_str())
        .bind(case_line.status().as_str())
        .bind(case_line.technician_id().0)
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn case_lines_for_case(&mut self, case_id: GuaranteeCaseId) -> AppResult<Vec<CaseLine>> {
        let rows = sqlx::query_as::<_, CaseLineRow>(
            r#"
            SELECT id, guarantee_case_id, diagnosis_text, correction_text,
                   type_component_id, quantity_needed, warranty_status, status, technician_id,
                   created_at, created_by, updated_at, updated_by
            FROM case_lines
            WHERE guarantee_case_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(case_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(case_line_from_row).collect()
    }

    async fn get_guarantee_case(&mut self, id: GuaranteeCaseId) -> AppResult<GuaranteeCase> {
        let row = sqlx::query_as::<_, GuaranteeCaseRow>(
            r#"
            SELECT id, vin, status, created_at, created_by, updated_at, updated_by
            FROM guarantee_cases
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("保修工单 {} 不存在", id)))?;
        guarantee_case_from_row(row)
    }

    async fn save_guarantee_case(&mut self, case: &GuaranteeCase) -> AppResult<()> {
        let audit = case.audit_info();
        sqlx::query(
            r#"
            INSERT INTO guarantee_cases (id, vin, status,
                                         created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(case.id().0)
        .bind(case.vin().as_str())
        .bind(case.status().as_str())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    // ========== 任务指派 ==========

    async fn get_task_assignment(&mut self, id: TaskAssignmentId) -> AppResult<TaskAssignment> {
        let row = sqlx::query_as::<_, TaskAssignmentRow>(
            r#"
            SELECT id, case_line_id, technician_id, task_type, assigned_at,
                   completed_at, is_active,
                   created_at, created_by, updated_at, updated_by
            FROM task_assignments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::not_found(format!("任务指派 {} 不存在", id)))?;
        task_assignment_from_row(row)
    }

    async fn active_task_assignment(
        &mut self,
        case_line_id: CaseLineId,
        task_type: TaskType,
    ) -> AppResult<Option<TaskAssignment>> {
        let row = sqlx::query_as::<_, TaskAssignmentRow>(
            r#"
            SELECT id, case_line_id, technician_id, task_type, assigned_at,
                   completed_at, is_active,
                   created_at, created_by, updated_at, updated_by
            FROM task_assignments
            WHERE case_line_id = $1 AND task_type = $2 AND is_active
            FOR UPDATE
            "#,
        )
        .bind(case_line_id.0)
        .bind(task_type.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        row.map(task_assignment_from_row).transpose()
    }

    async fn save_task_assignment(&mut self, assignment: &TaskAssignment) -> AppResult<()> {
        let audit = assignment.audit_info();
        sqlx::query(
            r#"
            INSERT INTO task_assignments (id, case_line_id, technician_id, task_type,
                                          assigned_at, completed_at, is_active,
                                          created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                completed_at = EXCLUDED.completed_at,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            "#,
        )
        .bind(assignment.id().0)
        .bind(assignment.case_line_id().0)
        .bind(assignment.technician_id().0)
        .bind(assignment.task_type().as_str())
        .bind(assignment.assigned_at())
        .bind(assignment.completed_at())
        .bind(assignment.is_active())
        .bind(audit.created_at)
        .bind(audit.created_by.map(|u| u.0))
        .bind(audit.updated_at)
        .bind(audit.updated_by.map(|u| u.0))
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    // ========== 事务边界 ==========

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(map_db_err)
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await.map_err(map_db_err)
    }
}
