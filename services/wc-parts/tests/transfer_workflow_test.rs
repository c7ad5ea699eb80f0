//! 调拨工作流：创建锁量、审批/驳回、发运、收货与总量守恒

mod support;

use domain_core::Entity;
use errors::AppError;
use wc_parts::application::commands::*;
use wc_parts::domain::enums::{CaseLineStatus, TransferStatus};
use wc_parts::domain::unit_of_work::UnitOfWorkFactory;
use wc_parts::domain::value_objects::TypeComponentId;

use support::TestContext;

#[tokio::test]
async fn create_transfer_locks_stock_at_source() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    assert_eq!(request.status(), TransferStatus::PendingApproval);
    assert!(!request.has_shortfall());
    assert_eq!(request.items()[0].source_warehouse_id(), Some(*regional.id()));
    // 源仓锁量，可用缩水
    ctx.assert_stock(*regional.id(), battery, 40, 7).await;

    let topics = ctx.notifier.topics().await;
    assert!(topics.contains(&"parts.transfer.created".to_string()));
}

// 多源仓时按仓库优先级选择
#[tokio::test]
async fn source_selection_prefers_higher_priority_warehouse() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let national = ctx.warehouse("NDC-CN", 5).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*national.id(), battery, 100).await;
    ctx.intake(*regional.id(), battery, 20).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 10,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    // 数字越小优先级越高：区域仓虽然量少但足够，优先于全国仓
    assert_eq!(request.items()[0].source_warehouse_id(), Some(*regional.id()));
    ctx.assert_stock(*regional.id(), battery, 20, 10).await;
    ctx.assert_stock(*national.id(), battery, 100, 0).await;
}

#[tokio::test]
async fn unfillable_item_records_shortfall_without_locking() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 3).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    assert!(request.has_shortfall());
    assert_eq!(request.items()[0].quantity_reserved(), 0);
    assert_eq!(request.items()[0].shortfall(), 7);
    ctx.assert_stock(*regional.id(), battery, 3, 0).await;
}

#[tokio::test]
async fn reject_releases_locked_stock_and_double_reject_fails() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();
    ctx.assert_stock(*regional.id(), battery, 40, 7).await;

    let rejected = ctx
        .transfers
        .reject(RejectTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
            reason: "区域仓备货期".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(rejected.status(), TransferStatus::Rejected);
    assert_eq!(rejected.rejection_reason(), Some("区域仓备货期"));
    // 锁定量全部回到可用
    ctx.assert_stock(*regional.id(), battery, 40, 0).await;

    // 第二次驳回被状态机拦截，且不得再动台账
    let err = ctx
        .transfers
        .reject(RejectTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
            reason: "再驳一次".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
    ctx.assert_stock(*regional.id(), battery, 40, 0).await;
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 2,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    let err = ctx
        .transfers
        .reject(RejectTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
            reason: "  ".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

// 总量守恒：发运扣源仓，收货入目的仓，途中总量不蒸发不凭空出现
#[tokio::test]
async fn full_transfer_conserves_total_stock() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    ctx.transfers
        .approve(ApproveTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();

    let shipped = ctx
        .transfers
        .ship(ShipTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();
    assert_eq!(shipped.status(), TransferStatus::Shipped);
    // 发运后源仓在手与预留同扣
    ctx.assert_stock(*regional.id(), battery, 33, 0).await;

    let received = ctx
        .transfers
        .receive(ReceiveTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();
    assert_eq!(received.status(), TransferStatus::Received);
    ctx.assert_stock(*local.id(), battery, 7, 0).await;
    ctx.assert_stock(*regional.id(), battery, 33, 0).await;

    let topics = ctx.notifier.topics().await;
    assert!(topics.contains(&"parts.transfer.shipped".to_string()));
    assert!(topics.contains(&"parts.transfer.received".to_string()));
}

#[tokio::test]
async fn ship_requires_approval_first() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    let err = ctx
        .transfers
        .ship(ShipTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn cancel_before_ship_releases_stock() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();

    ctx.transfers
        .approve(ApproveTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();

    let cancelled = ctx
        .transfers
        .cancel(CancelTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
            reason: "工单已取消".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status(), TransferStatus::Cancelled);
    ctx.assert_stock(*regional.id(), battery, 40, 0).await;
}

#[tokio::test]
async fn cancel_after_ship_is_rejected() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 7,
                case_line_id: None,
            }],
        })
        .await
        .unwrap();
    ctx.transfers
        .approve(ApproveTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();
    ctx.transfers
        .ship(ShipTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();

    let err = ctx
        .transfers
        .cancel(CancelTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
            reason: "太晚了".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

// 缺料工单行：到货后同事务自动续接预留并恢复维修
#[tokio::test]
async fn receive_auto_chains_reservation_for_waiting_case_line() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*regional.id(), battery, 40).await;

    // 本地无货触发缺口
    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 4).await;
    ctx.reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *local.id(),
        })
        .await
        .unwrap();

    // 按缺口开调拨并走完全程
    let request = ctx
        .transfers
        .create(CreateTransferCommand {
            user_id: ctx.user_id,
            requesting_warehouse_id: *local.id(),
            items: vec![TransferItemInput {
                type_component_id: battery,
                quantity: 4,
                case_line_id: Some(*line.id()),
            }],
        })
        .await
        .unwrap();
    ctx.transfers
        .approve(ApproveTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();
    ctx.transfers
        .ship(ShipTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();
    ctx.transfers
        .receive(ReceiveTransferCommand {
            user_id: ctx.user_id,
            transfer_request_id: *request.id(),
        })
        .await
        .unwrap();

    // 到货量立即被续接的预留占住
    ctx.assert_stock(*local.id(), battery, 4, 4).await;

    let mut uow = ctx.store.begin().await.unwrap();
    let line = uow.get_case_line(*line.id()).await.unwrap();
    assert_eq!(line.status(), CaseLineStatus::InProgress);
    let reservations = uow.reservations_for_case_line(*line.id()).await.unwrap();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0].quantity(), 4);
}
