//! 预留全流程：预留、领料、装车、取消与保修门禁

mod support;

use domain_core::{AggregateRoot, Entity};
use errors::AppError;
use wc_parts::application::commands::*;
use wc_parts::application::ReserveOutcome;
use wc_parts::domain::enums::{CaseLineStatus, ComponentStatus, ReservationStatus};
use wc_parts::domain::unit_of_work::UnitOfWorkFactory;
use wc_parts::domain::value_objects::TypeComponentId;

use support::{test_vin, TestContext};

#[tokio::test]
async fn reserve_pick_install_full_flow() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake_serialized(*wh.id(), battery, &["SN-A", "SN-B", "SN-C"])
        .await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 2).await;

    // 预留
    let outcome = ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap();
    let reservation = match outcome {
        ReserveOutcome::Reserved(r) => r,
        other => panic!("expected full reservation, got {:?}", other),
    };
    assert_eq!(reservation.status(), ReservationStatus::Reserved);
    ctx.assert_stock(*wh.id(), battery, 3, 2).await;

    // 两件配件被绑定为 RESERVED
    let mut uow = ctx.store.begin().await.unwrap();
    let components = uow
        .components_for_reservation(*reservation.id())
        .await
        .unwrap();
    assert_eq!(components.len(), 2);
    assert!(components
        .iter()
        .all(|c| c.status() == ComponentStatus::Reserved));
    drop(uow);

    // 领料
    let technician = support::technician();
    let picked = ctx
        .reservations
        .pick(PickReservationCommand {
            user_id: technician,
            reservation_id: *reservation.id(),
        })
        .await
        .unwrap();
    assert_eq!(picked.status(), ReservationStatus::Picked);
    assert_eq!(picked.picked_by(), Some(&technician));
    // 领料不动台账
    ctx.assert_stock(*wh.id(), battery, 3, 2).await;

    let mut uow = ctx.store.begin().await.unwrap();
    let components = uow
        .components_for_reservation(*reservation.id())
        .await
        .unwrap();
    assert!(components
        .iter()
        .all(|c| c.status() == ComponentStatus::WithTechnician));
    drop(uow);

    // 装车核销：在手与预留同扣
    let used = ctx
        .reservations
        .install(InstallReservationCommand {
            user_id: technician,
            reservation_id: *reservation.id(),
            vin: test_vin(),
        })
        .await
        .unwrap();
    assert_eq!(used.status(), ReservationStatus::Used);
    ctx.assert_stock(*wh.id(), battery, 1, 0).await;

    let mut uow = ctx.store.begin().await.unwrap();
    let components = uow
        .components_for_reservation(*reservation.id())
        .await
        .unwrap();
    assert!(components
        .iter()
        .all(|c| c.status() == ComponentStatus::Installed));
    assert!(components.iter().all(|c| c.installed_at().is_some()));
}

#[tokio::test]
async fn shortfall_leaves_ledger_untouched_and_reports_candidates() {
    let ctx = TestContext::new();
    let local = ctx.warehouse("SC-SH-01", 10).await;
    let regional = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    ctx.intake(*local.id(), battery, 3).await;
    ctx.intake(*regional.id(), battery, 40).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 7).await;

    let outcome = ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *local.id(),
        })
        .await
        .unwrap();

    match outcome {
        ReserveOutcome::Shortfall {
            requested,
            available,
            shortfall,
            candidates,
        } => {
            assert_eq!(requested, 7);
            assert_eq!(available, 3);
            assert_eq!(shortfall, 4);
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].warehouse_id, *regional.id());
        }
        other => panic!("expected shortfall, got {:?}", other),
    }

    // 不做部分预留
    ctx.assert_stock(*local.id(), battery, 3, 0).await;
    // 工单行转入待料
    let mut uow = ctx.store.begin().await.unwrap();
    let line = uow.get_case_line(*line.id()).await.unwrap();
    assert_eq!(line.status(), CaseLineStatus::WaitingForParts);
    drop(uow);

    // 缺口事件已派发
    let topics = ctx.notifier.topics().await;
    assert!(topics.contains(&"parts.reservation.shortfall".to_string()));
}

// 不在保的工单行必须在任何台账访问之前被拒绝
#[tokio::test]
async fn ineligible_case_line_cannot_touch_the_ledger() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 10).await;

    let case = ctx.open_case().await;
    let line = ctx.case_line(&case, battery, 2).await;
    ctx.case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warranty_status: wc_parts::domain::enums::WarrantyStatus::Ineligible,
        })
        .await
        .unwrap();

    let err = ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    // 台账分毫未动
    ctx.assert_stock(*wh.id(), battery, 10, 0).await;
}

#[tokio::test]
async fn pick_requires_reserved_status() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 5).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 1).await;
    let reservation = match ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap()
    {
        ReserveOutcome::Reserved(r) => r,
        other => panic!("expected reservation, got {:?}", other),
    };

    let technician = support::technician();
    ctx.reservations
        .pick(PickReservationCommand {
            user_id: technician,
            reservation_id: *reservation.id(),
        })
        .await
        .unwrap();

    // 重复领料被拒
    let err = ctx
        .reservations
        .pick(PickReservationCommand {
            user_id: technician,
            reservation_id: *reservation.id(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReservationNotPickable(_)));
}

#[tokio::test]
async fn cancel_releases_ledger_and_is_idempotent() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake_serialized(*wh.id(), battery, &["SN-A", "SN-B"])
        .await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 2).await;
    let reservation = match ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap()
    {
        ReserveOutcome::Reserved(r) => r,
        other => panic!("expected reservation, got {:?}", other),
    };
    ctx.assert_stock(*wh.id(), battery, 2, 2).await;

    let cancelled = ctx
        .reservations
        .cancel(CancelReservationCommand {
            user_id: ctx.user_id,
            reservation_id: *reservation.id(),
            reason: "客户改期".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
    ctx.assert_stock(*wh.id(), battery, 2, 0).await;

    // 配件回到在库
    let mut uow = ctx.store.begin().await.unwrap();
    let components = uow
        .take_available_components(*wh.id(), battery, 10)
        .await
        .unwrap();
    assert_eq!(components.len(), 2);
    drop(uow);

    // 第二次取消幂等：台账不再变化
    let again = ctx
        .reservations
        .cancel(CancelReservationCommand {
            user_id: ctx.user_id,
            reservation_id: *reservation.id(),
            reason: "重复取消".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(again.status(), ReservationStatus::Cancelled);
    ctx.assert_stock(*wh.id(), battery, 2, 0).await;

    // 取消事件只派发一次
    let payloads = ctx
        .notifier
        .payloads_for("parts.reservation.cancelled")
        .await;
    assert_eq!(payloads.len(), 1);
}

#[tokio::test]
async fn install_requires_picked_status() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 5).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 1).await;
    let reservation = match ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap()
    {
        ReserveOutcome::Reserved(r) => r,
        other => panic!("expected reservation, got {:?}", other),
    };

    // 未领料直接装车被状态机拦截
    let err = ctx
        .reservations
        .install(InstallReservationCommand {
            user_id: ctx.user_id,
            reservation_id: *reservation.id(),
            vin: test_vin(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
    ctx.assert_stock(*wh.id(), battery, 5, 1).await;
}

// 每次状态变更都要落审计：updated_by 换人、updated_at 前移
#[tokio::test]
async fn mutations_stamp_audit_info() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 5).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 2).await;
    let reservation = match ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap()
    {
        ReserveOutcome::Reserved(r) => r,
        other => panic!("expected reservation, got {:?}", other),
    };

    let picker = support::technician();
    ctx.reservations
        .pick(PickReservationCommand {
            user_id: picker,
            reservation_id: *reservation.id(),
        })
        .await
        .unwrap();

    let mut uow = ctx.store.begin().await.unwrap();
    let picked = uow.get_reservation(*reservation.id()).await.unwrap();
    let audit = picked.audit_info();
    assert_eq!(audit.created_by, Some(ctx.user_id));
    assert_eq!(audit.updated_by, Some(picker));
    assert!(audit.updated_at >= audit.created_at);
}
