//! 工单行生命周期与工单头汇总

mod support;

use domain_core::Entity;
use errors::AppError;
use wc_parts::application::commands::*;
use wc_parts::application::ReserveOutcome;
use wc_parts::domain::enums::{CaseLineStatus, GuaranteeCaseStatus, WarrantyStatus};
use wc_parts::domain::unit_of_work::UnitOfWorkFactory;
use wc_parts::domain::value_objects::TypeComponentId;

use support::TestContext;

#[tokio::test]
async fn open_case_then_diagnose_updates_case_status() {
    let ctx = TestContext::new();
    let case = ctx.open_case().await;
    assert_eq!(case.status(), GuaranteeCaseStatus::PendingAssignment);

    ctx.case_line(&case, TypeComponentId::new(), 1).await;

    let mut uow = ctx.store.begin().await.unwrap();
    let case = uow.get_guarantee_case(*case.id()).await.unwrap();
    assert_eq!(case.status(), GuaranteeCaseStatus::InDiagnosis);
}

#[tokio::test]
async fn warranty_approval_without_parts_starts_work_directly() {
    let ctx = TestContext::new();
    let case = ctx.open_case().await;

    // 纯工时行：无换件需求
    let line = ctx
        .case_lines
        .create_case_line(CreateCaseLineCommand {
            user_id: ctx.user_id,
            guarantee_case_id: *case.id(),
            diagnosis_text: "软件标定偏差，无需换件".to_string(),
            type_component_id: None,
            quantity_needed: 0,
        })
        .await
        .unwrap();

    let line = ctx
        .case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warranty_status: WarrantyStatus::Eligible,
        })
        .await
        .unwrap();
    assert_eq!(line.warranty_status(), WarrantyStatus::Eligible);
    assert_eq!(line.status(), CaseLineStatus::InProgress);
}

#[tokio::test]
async fn warranty_rejection_freezes_lifecycle() {
    let ctx = TestContext::new();
    let case = ctx.open_case().await;
    let line = ctx.case_line(&case, TypeComponentId::new(), 2).await;

    let line = ctx
        .case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warranty_status: WarrantyStatus::Ineligible,
        })
        .await
        .unwrap();
    assert_eq!(line.warranty_status(), WarrantyStatus::Ineligible);
    // 生命周期留在原地，等客户付费流程接走
    assert_eq!(line.status(), CaseLineStatus::PendingApproval);

    // 裁定不可重复
    let err = ctx
        .case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warranty_status: WarrantyStatus::Eligible,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn warranty_status_must_be_decided() {
    let ctx = TestContext::new();
    let case = ctx.open_case().await;
    let line = ctx.case_line(&case, TypeComponentId::new(), 1).await;

    let err = ctx
        .case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warranty_status: WarrantyStatus::PendingApproval,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn complete_requires_in_progress_and_records_correction() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 5).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 1).await;

    // 未开工不能完工
    let err = ctx
        .case_lines
        .complete_case_line(CompleteCaseLineCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            correction_text: "更换电池模组".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    // 预留后进入维修中，完工落修复说明
    ctx.reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap();

    let done = ctx
        .case_lines
        .complete_case_line(CompleteCaseLineCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            correction_text: "更换电池模组并重新标定".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(done.status(), CaseLineStatus::Completed);
    assert_eq!(done.correction_text(), "更换电池模组并重新标定");
}

#[tokio::test]
async fn cancel_case_line_cancels_reservations_and_releases_stock() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 6).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 4).await;
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
    ctx.assert_stock(*wh.id(), battery, 6, 4).await;

    let cancelled = ctx
        .case_lines
        .cancel_case_line(CancelCaseLineCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            reason: "客户撤单".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status(), CaseLineStatus::Cancelled);
    ctx.assert_stock(*wh.id(), battery, 6, 0).await;

    let mut uow = ctx.store.begin().await.unwrap();
    let reservation = uow.get_reservation(*reservation.id()).await.unwrap();
    assert_eq!(
        reservation.status(),
        wc_parts::domain::enums::ReservationStatus::Cancelled
    );
}

#[tokio::test]
async fn case_rolls_up_to_diagnosed_when_every_line_left_pending() {
    let ctx = TestContext::new();
    let case = ctx.open_case().await;

    let mut line_ids = Vec::new();
    for text in ["电机噪音", "空调异响"] {
        let line = ctx
            .case_lines
            .create_case_line(CreateCaseLineCommand {
                user_id: ctx.user_id,
                guarantee_case_id: *case.id(),
                diagnosis_text: text.to_string(),
                type_component_id: None,
                quantity_needed: 0,
            })
            .await
            .unwrap();
        line_ids.push(*line.id());
    }

    // 只裁定一行：另一行仍待审批，工单头停在诊断中
    ctx.case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: line_ids[0],
            warranty_status: WarrantyStatus::Eligible,
        })
        .await
        .unwrap();
    let mut uow = ctx.store.begin().await.unwrap();
    let current = uow.get_guarantee_case(*case.id()).await.unwrap();
    assert_eq!(current.status(), GuaranteeCaseStatus::InDiagnosis);
    drop(uow);

    // 所有行离开待审批后，工单头进入已诊断
    ctx.case_lines
        .set_warranty_status(SetWarrantyStatusCommand {
            user_id: ctx.user_id,
            case_line_id: line_ids[1],
            warranty_status: WarrantyStatus::Eligible,
        })
        .await
        .unwrap();
    let mut uow = ctx.store.begin().await.unwrap();
    let current = uow.get_guarantee_case(*case.id()).await.unwrap();
    assert_eq!(current.status(), GuaranteeCaseStatus::Diagnosed);
}
