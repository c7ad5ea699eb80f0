//! 预留流程处理器
//!
//! 预留/领料/装车/取消都在单个工作单元内完成台账与实体的联动变更，
//! 序列化冲突由 `retry_once` 自动重试一次。

use std::sync::Arc;

use common::retry::retry_once;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use ports::NotificationDispatcher;
use tracing::{info, warn};

use crate::domain::entities::{Reservation, StockCandidate};
use crate::domain::events::{EventMetadata, PartsEvent};
use crate::domain::unit_of_work::UnitOfWorkFactory;

use crate::application::commands::*;

use super::notify;

/// 预留请求的结果：要么整量预留成功，要么一件不留并报告缺口。
#[derive(Debug)]
pub enum ReserveOutcome {
    Reserved(Reservation),
    Shortfall {
        requested: i64,
        available: i64,
        shortfall: i64,
        /// 其他仓库的候选货源，按优先级与可用量排序
        candidates: Vec<StockCandidate>,
    },
}

pub struct ReservationHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl ReservationHandler {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            uow_factory,
            notifier,
        }
    }

    // ========== 预留 ==========

    /// 为工单行预留配件（全量或零量）
    pub async fn reserve(&self, cmd: ReservePartsCommand) -> AppResult<ReserveOutcome> {
        super::trace_invariant(retry_once(|| self.reserve_inner(&cmd), AppError::is_retryable).await)
    }

    async fn reserve_inner(&self, cmd: &ReservePartsCommand) -> AppResult<ReserveOutcome> {
        let mut uow = self.uow_factory.begin().await?;

        // 1. 保修门禁：未裁定或不在保的工单行不得触碰台账
        let mut case_line = uow.get_case_line(cmd.case_line_id).await?;
        if !case_line.warranty_status().allows_reservation() {
            return Err(AppError::invalid_transition(
                "case line",
                case_line.warranty_status().as_str(),
                "reserve_parts",
            ));
        }
        let type_component_id = case_line.type_component_id().ok_or_else(|| {
            AppError::validation(format!("工单行 {} 无换件需求", cmd.case_line_id))
        })?;
        let quantity = case_line.quantity_needed();

        // 2. 锁定本地库存行；行不存在视同可用量为零
        let stock_line = match uow
            .lock_stock_line(cmd.warehouse_id, type_component_id)
            .await
        {
            Ok(line) => Some(line),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let available = stock_line
            .as_ref()
            .map(|l| l.quantity_available())
            .unwrap_or(0);

        // 3. 可用量不足：不做部分预留，工单行转入待料并上报缺口
        if available < quantity {
            let shortfall = quantity - available;
            warn!(
                "Insufficient stock for case line {}: requested {}, available {}",
                cmd.case_line_id, quantity, available
            );

            case_line.mark_waiting_for_parts()?;
            case_line.audit_info_mut().update(Some(cmd.user_id));
            uow.save_case_line(&case_line).await?;

            let candidates = uow
                .list_stock_candidates(type_component_id, Some(cmd.warehouse_id))
                .await?;
            uow.commit().await?;

            metrics::counter!("parts_reservation_shortfall_total").increment(1);
            notify(
                self.notifier.as_ref(),
                &PartsEvent::ReservationShortfall {
                    metadata: EventMetadata::new(Some(cmd.user_id)),
                    case_line_id: cmd.case_line_id,
                    warehouse_id: cmd.warehouse_id,
                    type_component_id,
                    requested: quantity,
                    available,
                    shortfall,
                },
                &[],
            )
            .await;

            return Ok(ReserveOutcome::Shortfall {
                requested: quantity,
                available,
                shortfall,
                candidates,
            });
        }

        // 4. 全量预留：台账、预留单、物理配件同事务落库
        let mut stock_line = stock_line
            .ok_or_else(|| AppError::invariant_violation("stock line vanished under lock"))?;
        stock_line.reserve(quantity)?;
        uow.save_stock_line(&stock_line).await?;

        let mut reservation = Reservation::new(
            cmd.case_line_id,
            cmd.warehouse_id,
            type_component_id,
            quantity,
        );
        reservation.audit_info_mut().created_by = Some(cmd.user_id);
        uow.save_reservation(&reservation).await?;

        // 序列化配件按件绑定；台账为准，序列号不足不阻塞预留
        let components = uow
            .take_available_components(cmd.warehouse_id, type_component_id, quantity)
            .await?;
        for mut component in components {
            component.reserve_for_case_line(*reservation.id())?;
            uow.save_component(&component).await?;
        }

        case_line.start_progress()?;
        uow.save_case_line(&case_line).await?;
        uow.commit().await?;

        metrics::counter!("parts_reserved_total").increment(quantity as u64);
        info!(
            "Reserved {} x {} for case line {} at warehouse {}",
            quantity, type_component_id, cmd.case_line_id, cmd.warehouse_id
        );

        Ok(ReserveOutcome::Reserved(reservation))
    }

    // ========== 领料 ==========

    /// 技师领料：预留转入已领，配件交到技师手上
    pub async fn pick(&self, cmd: PickReservationCommand) -> AppResult<Reservation> {
        retry_once(|| self.pick_inner(&cmd), AppError::is_retryable).await
    }

    async fn pick_inner(&self, cmd: &PickReservationCommand) -> AppResult<Reservation> {
        let mut uow = self.uow_factory.begin().await?;

        let mut reservation = uow.get_reservation(cmd.reservation_id).await?;
        reservation.pick(cmd.user_id)?;
        reservation.audit_info_mut().update(Some(cmd.user_id));
        uow.save_reservation(&reservation).await?;

        let components = uow.components_for_reservation(cmd.reservation_id).await?;
        for mut component in components {
            component.hand_to_technician(cmd.user_id)?;
            uow.save_component(&component).await?;
        }

        uow.commit().await?;
        info!(
            "Reservation {} picked by technician {}",
            cmd.reservation_id, cmd.user_id
        );
        Ok(reservation)
    }

    // ========== 装车核销 ==========

    /// 装车：预留核销，在手量与预留量同时扣减
    pub async fn install(&self, cmd: InstallReservationCommand) -> AppResult<Reservation> {
        super::trace_invariant(retry_once(|| self.install_inner(&cmd), AppError::is_retryable).await)
    }

    async fn install_inner(&self, cmd: &InstallReservationCommand) -> AppResult<Reservation> {
        let mut uow = self.uow_factory.begin().await?;

        let mut reservation = uow.get_reservation(cmd.reservation_id).await?;
        reservation.mark_used()?;
        reservation.audit_info_mut().update(Some(cmd.user_id));

        let mut stock_line = uow
            .lock_stock_line(reservation.warehouse_id(), reservation.type_component_id())
            .await?;
        stock_line.consume(reservation.quantity())?;
        uow.save_stock_line(&stock_line).await?;
        uow.save_reservation(&reservation).await?;

        let components = uow.components_for_reservation(cmd.reservation_id).await?;
        for mut component in components {
            component.install(cmd.vin.clone())?;
            uow.save_component(&component).await?;
        }

        uow.commit().await?;
        metrics::counter!("parts_installed_total").increment(reservation.quantity() as u64);
        info!(
            "Reservation {} installed on vehicle {}",
            cmd.reservation_id,
            cmd.vin.as_str()
        );
        Ok(reservation)
    }

    // ========== 取消 ==========

    /// 取消预留并释放台账；重复取消幂等返回当前状态
    pub async fn cancel(&self, cmd: CancelReservationCommand) -> AppResult<Reservation> {
        cmd.validate()?;
        super::trace_invariant(retry_once(|| self.cancel_inner(&cmd), AppError::is_retryable).await)
    }

    async fn cancel_inner(&self, cmd: &CancelReservationCommand) -> AppResult<Reservation> {
        let mut uow = self.uow_factory.begin().await?;

        let mut reservation = uow.get_reservation(cmd.reservation_id).await?;
        // 已取消时 cancel 返回 false，幂等不再动台账
        if !reservation.cancel(&cmd.reason)? {
            return Ok(reservation);
        }
        reservation.audit_info_mut().update(Some(cmd.user_id));

        let mut stock_line = uow
            .lock_stock_line(reservation.warehouse_id(), reservation.type_component_id())
            .await?;
        stock_line.release(reservation.quantity())?;
        uow.save_stock_line(&stock_line).await?;
        uow.save_reservation(&reservation).await?;

        let components = uow.components_for_reservation(cmd.reservation_id).await?;
        for mut component in components {
            component.release_to_warehouse(reservation.warehouse_id())?;
            uow.save_component(&component).await?;
        }

        uow.commit().await?;
        metrics::counter!("parts_reservation_cancelled_total").increment(1);
        info!("Reservation {} cancelled: {}", cmd.reservation_id, cmd.reason);

        notify(
            self.notifier.as_ref(),
            &PartsEvent::ReservationCancelled {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                reservation_id: cmd.reservation_id,
                reason: cmd.reason.clone(),
            },
            &[],
        )
        .await;

        Ok(reservation)
    }
}
