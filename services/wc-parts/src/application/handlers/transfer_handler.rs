//! 调拨流程处理器
//!
//! 创建即在源仓锁量，驳回/取消释放，发运扣减在途，收货入账；
//! 带工单行回指的明细在收货时自动续接预留。

use std::sync::Arc;

use common::retry::retry_once;
use domain_core::{AggregateRoot, Entity};
use errors::{AppError, AppResult};
use ports::NotificationDispatcher;
use tracing::{info, warn};

use crate::domain::entities::{
    Reservation, StockReservation, StockTransferRequest, StockTransferRequestItem,
};
use crate::domain::enums::{CaseLineStatus, ComponentStatus};
use crate::domain::events::{EventMetadata, PartsEvent};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::value_objects::{CaseLineId, TransferRequestId, WarehouseId};

use crate::application::commands::*;

use super::notify;

pub struct TransferHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl TransferHandler {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            uow_factory,
            notifier,
        }
    }

    // ========== 创建 ==========

    /// 创建调拨申请并在源仓锁定可满足的量
    pub async fn create(&self, cmd: CreateTransferCommand) -> AppResult<StockTransferRequest> {
        cmd.validate()?;
        super::trace_invariant(retry_once(|| self.create_inner(&cmd), AppError::is_retryable).await)
    }

    async fn create_inner(&self, cmd: &CreateTransferCommand) -> AppResult<StockTransferRequest> {
        let mut uow = self.uow_factory.begin().await?;

        // 收货仓必须存在
        uow.get_warehouse(cmd.requesting_warehouse_id).await?;

        let items: Vec<StockTransferRequestItem> = cmd
            .items
            .iter()
            .map(|i| StockTransferRequestItem::new(i.type_component_id, i.quantity, i.case_line_id))
            .collect();
        let mut request =
            StockTransferRequest::new(cmd.requesting_warehouse_id, cmd.user_id, items)?;
        request.audit_info_mut().created_by = Some(cmd.user_id);
        let request_id = *request.id();

        // 逐明细选源仓：优先级高且可用量足者得，单源满足，不拆仓
        for item in request.items_mut() {
            let needed = item.quantity_requested();
            let candidates = uow
                .list_stock_candidates(item.type_component_id(), Some(cmd.requesting_warehouse_id))
                .await?;
            let source = candidates
                .into_iter()
                .find(|c| c.stock_line.quantity_available() >= needed);

            let Some(source) = source else {
                warn!(
                    "No source warehouse can cover {} x {} for transfer {}",
                    needed,
                    item.type_component_id(),
                    request_id
                );
                continue;
            };

            let mut line = uow
                .lock_stock_line(source.warehouse_id, item.type_component_id())
                .await?;
            line.reserve(needed)?;
            uow.save_stock_line(&line).await?;
            item.mark_reserved(source.warehouse_id, needed);

            let stock_reservation = StockReservation::new(
                item.id(),
                source.warehouse_id,
                item.type_component_id(),
                needed,
            );
            uow.save_stock_reservation(&stock_reservation).await?;

            let components = uow
                .take_available_components(source.warehouse_id, item.type_component_id(), needed)
                .await?;
            for mut component in components {
                component.reserve_for_transfer(request_id)?;
                uow.save_component(&component).await?;
            }
        }

        uow.save_transfer_request(&request).await?;
        uow.commit().await?;

        metrics::counter!("parts_transfer_created_total").increment(1);
        info!(
            "Transfer request {} created with {} item(s), shortfall: {}",
            request_id,
            request.items().len(),
            request.has_shortfall()
        );

        notify(
            self.notifier.as_ref(),
            &PartsEvent::TransferCreated {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                transfer_request_id: request_id,
                requesting_warehouse_id: cmd.requesting_warehouse_id,
                has_shortfall: request.has_shortfall(),
            },
            &[],
        )
        .await;

        Ok(request)
    }

    // ========== 审批 ==========

    pub async fn approve(&self, cmd: ApproveTransferCommand) -> AppResult<StockTransferRequest> {
        retry_once(|| self.approve_inner(&cmd), AppError::is_retryable).await
    }

    async fn approve_inner(&self, cmd: &ApproveTransferCommand) -> AppResult<StockTransferRequest> {
        let mut uow = self.uow_factory.begin().await?;

        let mut request = uow.get_transfer_request(cmd.transfer_request_id).await?;
        request.approve(cmd.user_id)?;
        request.audit_info_mut().update(Some(cmd.user_id));
        uow.save_transfer_request(&request).await?;
        uow.commit().await?;

        info!("Transfer request {} approved", cmd.transfer_request_id);
        notify(
            self.notifier.as_ref(),
            &PartsEvent::TransferApproved {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                transfer_request_id: cmd.transfer_request_id,
            },
            &[],
        )
        .await;
        Ok(request)
    }

    /// 驳回：状态机拦截重复驳回，已锁的源仓量全部释放
    pub async fn reject(&self, cmd: RejectTransferCommand) -> AppResult<StockTransferRequest> {
        super::trace_invariant(retry_once(|| self.reject_inner(&cmd), AppError::is_retryable).await)
    }

    async fn reject_inner(&self, cmd: &RejectTransferCommand) -> AppResult<StockTransferRequest> {
        let mut uow = self.uow_factory.begin().await?;

        let mut request = uow.get_transfer_request(cmd.transfer_request_id).await?;
        request.reject(cmd.user_id, &cmd.reason)?;
        request.audit_info_mut().update(Some(cmd.user_id));

        self.release_holds(uow.as_mut(), cmd.transfer_request_id)
            .await?;
        uow.save_transfer_request(&request).await?;
        uow.commit().await?;

        info!(
            "Transfer request {} rejected: {}",
            cmd.transfer_request_id, cmd.reason
        );
        notify(
            self.notifier.as_ref(),
            &PartsEvent::TransferRejected {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                transfer_request_id: cmd.transfer_request_id,
                reason: cmd.reason.clone(),
            },
            &[],
        )
        .await;
        Ok(request)
    }

    /// 发运前取消，释放源仓锁定量
    pub async fn cancel(&self, cmd: CancelTransferCommand) -> AppResult<StockTransferRequest> {
        super::trace_invariant(retry_once(|| self.cancel_inner(&cmd), AppError::is_retryable).await)
    }

    async fn cancel_inner(&self, cmd: &CancelTransferCommand) -> AppResult<StockTransferRequest> {
        let mut uow = self.uow_factory.begin().await?;

        let mut request = uow.get_transfer_request(cmd.transfer_request_id).await?;
        request.cancel(cmd.user_id, &cmd.reason)?;
        request.audit_info_mut().update(Some(cmd.user_id));

        self.release_holds(uow.as_mut(), cmd.transfer_request_id)
            .await?;
        uow.save_transfer_request(&request).await?;
        uow.commit().await?;

        info!(
            "Transfer request {} cancelled: {}",
            cmd.transfer_request_id, cmd.reason
        );
        Ok(request)
    }

    /// 释放请求名下仍占库存的调拨预留与配件
    async fn release_holds(
        &self,
        uow: &mut dyn UnitOfWork,
        transfer_request_id: TransferRequestId,
    ) -> AppResult<()> {
        let stock_reservations = uow
            .stock_reservations_for_request(transfer_request_id)
            .await?;
        for mut sr in stock_reservations {
            if !sr.status().holds_stock() {
                continue;
            }
            let mut line = uow
                .lock_stock_line(sr.warehouse_id(), sr.type_component_id())
                .await?;
            line.release(sr.quantity_reserved())?;
            uow.save_stock_line(&line).await?;
            sr.cancel()?;
            uow.save_stock_reservation(&sr).await?;
        }

        // 配件释放回各自的源仓（监管链里仍记着源仓）
        let components = uow.components_for_transfer(transfer_request_id).await?;
        for mut component in components {
            if component.status() != ComponentStatus::Reserved {
                continue;
            }
            let Some(warehouse_id) = component.custody().warehouse_id() else {
                continue;
            };
            component.release_to_warehouse(warehouse_id)?;
            uow.save_component(&component).await?;
        }
        Ok(())
    }

    // ========== 发运 ==========

    /// 发运：源仓在手与预留同扣，配件转入在途
    pub async fn ship(&self, cmd: ShipTransferCommand) -> AppResult<StockTransferRequest> {
        super::trace_invariant(retry_once(|| self.ship_inner(&cmd), AppError::is_retryable).await)
    }

    async fn ship_inner(&self, cmd: &ShipTransferCommand) -> AppResult<StockTransferRequest> {
        let mut uow = self.uow_factory.begin().await?;

        let mut request = uow.get_transfer_request(cmd.transfer_request_id).await?;
        request.ship()?;
        request.audit_info_mut().update(Some(cmd.user_id));

        let stock_reservations = uow
            .stock_reservations_for_request(cmd.transfer_request_id)
            .await?;
        for mut sr in stock_reservations {
            if !sr.status().holds_stock() {
                continue;
            }
            let mut line = uow
                .lock_stock_line(sr.warehouse_id(), sr.type_component_id())
                .await?;
            line.consume(sr.quantity_reserved())?;
            uow.save_stock_line(&line).await?;
            sr.ship()?;
            uow.save_stock_reservation(&sr).await?;
        }

        let components = uow
            .components_for_transfer(cmd.transfer_request_id)
            .await?;
        for mut component in components {
            component.ship()?;
            uow.save_component(&component).await?;
        }

        uow.save_transfer_request(&request).await?;
        uow.commit().await?;

        metrics::counter!("parts_transfer_shipped_total").increment(1);
        info!("Transfer request {} shipped", cmd.transfer_request_id);
        notify(
            self.notifier.as_ref(),
            &PartsEvent::TransferShipped {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                transfer_request_id: cmd.transfer_request_id,
            },
            &[],
        )
        .await;
        Ok(request)
    }

    // ========== 收货 ==========

    /// 收货：入请求仓台账；回指工单行的明细自动续接预留
    pub async fn receive(&self, cmd: ReceiveTransferCommand) -> AppResult<StockTransferRequest> {
        super::trace_invariant(retry_once(|| self.receive_inner(&cmd), AppError::is_retryable).await)
    }

    async fn receive_inner(&self, cmd: &ReceiveTransferCommand) -> AppResult<StockTransferRequest> {
        let mut uow = self.uow_factory.begin().await?;

        let mut request = uow.get_transfer_request(cmd.transfer_request_id).await?;
        request.receive(cmd.user_id)?;
        request.audit_info_mut().update(Some(cmd.user_id));
        let receiving_warehouse_id = request.requesting_warehouse_id();

        // 1. 到货入账
        for item in request.items() {
            if item.quantity_reserved() == 0 {
                continue;
            }
            let mut line = uow
                .lock_or_create_stock_line(receiving_warehouse_id, item.type_component_id())
                .await?;
            line.increase(item.quantity_reserved())?;
            uow.save_stock_line(&line).await?;
        }

        // 2. 在途配件落到收货仓
        let components = uow
            .components_for_transfer(cmd.transfer_request_id)
            .await?;
        for mut component in components {
            component.arrive(receiving_warehouse_id)?;
            uow.save_component(&component).await?;
        }

        // 3. 缺料工单行续接：同事务内直接转预留
        for item in request.items() {
            let Some(case_line_id) = item.case_line_id() else {
                continue;
            };
            if item.quantity_reserved() == 0 {
                continue;
            }
            self.chain_reservation(
                uow.as_mut(),
                cmd.user_id,
                case_line_id,
                receiving_warehouse_id,
            )
            .await?;
        }

        uow.save_transfer_request(&request).await?;
        uow.commit().await?;

        metrics::counter!("parts_transfer_received_total").increment(1);
        info!(
            "Transfer request {} received at warehouse {}",
            cmd.transfer_request_id, receiving_warehouse_id
        );
        notify(
            self.notifier.as_ref(),
            &PartsEvent::TransferReceived {
                metadata: EventMetadata::new(Some(cmd.user_id)),
                transfer_request_id: cmd.transfer_request_id,
                receiving_warehouse_id,
            },
            &[],
        )
        .await;
        Ok(request)
    }

    /// 到货后为待料工单行续接预留；条件不满足时跳过而非报错
    async fn chain_reservation(
        &self,
        uow: &mut dyn UnitOfWork,
        user_id: common::UserId,
        case_line_id: CaseLineId,
        warehouse_id: WarehouseId,
    ) -> AppResult<()> {
        let mut case_line = match uow.get_case_line(case_line_id).await {
            Ok(line) => line,
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        if case_line.status() != CaseLineStatus::WaitingForParts
            || !case_line.warranty_status().allows_reservation()
        {
            return Ok(());
        }
        let Some(type_component_id) = case_line.type_component_id() else {
            return Ok(());
        };
        let quantity = case_line.quantity_needed();

        let mut line = uow.lock_stock_line(warehouse_id, type_component_id).await?;
        if line.quantity_available() < quantity {
            warn!(
                "Received stock still short for case line {}: available {}, needed {}",
                case_line_id,
                line.quantity_available(),
                quantity
            );
            return Ok(());
        }
        line.reserve(quantity)?;
        uow.save_stock_line(&line).await?;

        let reservation = Reservation::new(case_line_id, warehouse_id, type_component_id, quantity);
        uow.save_reservation(&reservation).await?;

        let components = uow
            .take_available_components(warehouse_id, type_component_id, quantity)
            .await?;
        for mut component in components {
            component.reserve_for_case_line(*reservation.id())?;
            uow.save_component(&component).await?;
        }

        case_line.start_progress()?;
        case_line.audit_info_mut().update(Some(user_id));
        uow.save_case_line(&case_line).await?;

        info!(
            "Chained reservation {} for waiting case line {}",
            reservation.id(),
            case_line_id
        );
        Ok(())
    }
}
