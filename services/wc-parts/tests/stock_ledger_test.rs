//! 库存台账：入库、三量守恒与查询

mod support;

use common::Pagination;
use domain_core::Entity;
use wc_parts::application::commands::*;
use wc_parts::application::queries::*;
use wc_parts::application::ReserveOutcome;
use wc_parts::domain::value_objects::TypeComponentId;
use errors::AppError;

use support::TestContext;

#[tokio::test]
async fn intake_builds_up_stock_line() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();

    ctx.intake(*wh.id(), battery, 10).await;
    ctx.assert_stock(*wh.id(), battery, 10, 0).await;

    // 再次入库走同一行
    ctx.intake(*wh.id(), battery, 5).await;
    ctx.assert_stock(*wh.id(), battery, 15, 0).await;
}

#[tokio::test]
async fn intake_rejects_non_positive_quantity() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;

    let err = ctx
        .inventory
        .stock_intake(StockIntakeCommand {
            user_id: ctx.user_id,
            warehouse_id: *wh.id(),
            type_component_id: TypeComponentId::new(),
            quantity: 0,
            serial_numbers: Vec::new(),
            reason: "测试".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity(_)));
}

#[tokio::test]
async fn intake_serial_count_must_match_quantity() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;

    let err = ctx
        .inventory
        .stock_intake(StockIntakeCommand {
            user_id: ctx.user_id,
            warehouse_id: *wh.id(),
            type_component_id: TypeComponentId::new(),
            quantity: 3,
            serial_numbers: vec!["SN-001".to_string()],
            reason: "测试".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn duplicate_serial_number_is_rejected() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();

    ctx.intake_serialized(*wh.id(), battery, &["SN-001"]).await;
    let err = ctx
        .inventory
        .stock_intake(StockIntakeCommand {
            user_id: ctx.user_id,
            warehouse_id: *wh.id(),
            type_component_id: battery,
            quantity: 1,
            serial_numbers: vec!["SN-001".to_string()],
            reason: "重复序列号".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_warehouse_code_is_rejected() {
    let ctx = TestContext::new();
    ctx.warehouse("SC-SH-01", 10).await;

    let err = ctx
        .inventory
        .register_warehouse(RegisterWarehouseCommand {
            user_id: ctx.user_id,
            code: "SC-SH-01".to_string(),
            name: "重复仓".to_string(),
            priority: 20,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

// 预留后三量核对：在手不变，预留增加，可用缩水
#[tokio::test]
async fn reserve_keeps_on_hand_and_shrinks_available() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 10).await;

    let case = ctx.open_case().await;
    let line = ctx.eligible_case_line(&case, battery, 4).await;

    let outcome = ctx
        .reservations
        .reserve(ReservePartsCommand {
            user_id: ctx.user_id,
            case_line_id: *line.id(),
            warehouse_id: *wh.id(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, ReserveOutcome::Reserved(_)));

    ctx.assert_stock(*wh.id(), battery, 10, 4).await;
}

#[tokio::test]
async fn inventory_summary_aggregates_per_warehouse() {
    let ctx = TestContext::new();
    let wh1 = ctx.warehouse("SC-SH-01", 10).await;
    let wh2 = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    let inverter = TypeComponentId::new();

    ctx.intake(*wh1.id(), battery, 10).await;
    ctx.intake(*wh1.id(), inverter, 3).await;
    ctx.intake(*wh2.id(), battery, 50).await;

    let page = ctx
        .inventory
        .inventory_summary(InventorySummaryQuery {
            warehouse_id: Some(*wh1.id()),
            type_component_id: None,
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].total_in_stock, 13);
    assert_eq!(page.items[0].total_reserved, 0);
    assert_eq!(page.items[0].total_available, 13);

    let all = ctx
        .inventory
        .inventory_summary(InventorySummaryQuery {
            warehouse_id: None,
            type_component_id: None,
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(all.total, 2);
}

#[tokio::test]
async fn inventory_summary_filters_by_type_component() {
    let ctx = TestContext::new();
    let wh1 = ctx.warehouse("SC-SH-01", 10).await;
    let wh2 = ctx.warehouse("RDC-CN-EAST", 1).await;
    let battery = TypeComponentId::new();
    let inverter = TypeComponentId::new();

    ctx.intake(*wh1.id(), battery, 10).await;
    ctx.intake(*wh1.id(), inverter, 3).await;
    ctx.intake(*wh2.id(), inverter, 7).await;

    // 件型过滤：inverter 只在两仓各有一行，battery 行不得计入
    let page = ctx
        .inventory
        .inventory_summary(InventorySummaryQuery {
            warehouse_id: None,
            type_component_id: Some(inverter),
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let total_in_stock: i64 = page.items.iter().map(|s| s.total_in_stock).sum();
    assert_eq!(total_in_stock, 10);

    // 仓库 + 件型联合过滤
    let page = ctx
        .inventory
        .inventory_summary(InventorySummaryQuery {
            warehouse_id: Some(*wh1.id()),
            type_component_id: Some(battery),
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].total_in_stock, 10);
    assert_eq!(page.items[0].total_available, 10);
}

#[tokio::test]
async fn inventory_detail_filters_by_type_component() {
    let ctx = TestContext::new();
    let wh = ctx.warehouse("SC-SH-01", 10).await;
    let battery = TypeComponentId::new();
    let inverter = TypeComponentId::new();
    ctx.intake(*wh.id(), battery, 10).await;
    ctx.intake(*wh.id(), inverter, 3).await;

    let page = ctx
        .inventory
        .inventory_type_components(InventoryTypeComponentsQuery {
            warehouse_id: Some(*wh.id()),
            type_component_id: Some(battery),
            pagination: Pagination::default(),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].type_component_id, battery);
    assert_eq!(page.items[0].quantity_in_stock, 10);
}
