//! 并发预留：同一库存行上的并行请求不得超卖

mod support;

use std::sync::Arc;

use domain_core::Entity;
use futures::future::join_all;
use wc_parts::application::commands::ReservePartsCommand;
use wc_parts::application::ReserveOutcome;
use wc_parts::domain::value_objects::TypeComponentId;

use support::TestContext;

// 10 件库存，6 条工单行各要 3 件：恰好 3 成功 3 缺料，
// 预留量必须等于成功数 × 3，且任何时刻不超过在库量
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reserves_never_oversell() {
    let ctx = TestContext::new();
    let type_id = TypeComponentId::new();
    let wh = ctx.warehouse("WH-SHA-01", 0).await;
    ctx.intake(*wh.id(), type_id, 10).await;

    let mut lines = Vec::new();
    for _ in 0..6 {
        let case = ctx.open_case().await;
        lines.push(ctx.eligible_case_line(&case, type_id, 3).await);
    }

    let handler = Arc::new(ctx.reservation_handler());
    let tasks: Vec<_> = lines
        .iter()
        .map(|line| {
            let handler = Arc::clone(&handler);
            let cmd = ReservePartsCommand {
                user_id: ctx.user_id,
                case_line_id: *line.id(),
                warehouse_id: *wh.id(),
            };
            tokio::spawn(async move { handler.reserve(cmd).await })
        })
        .collect();

    let mut reserved = 0;
    let mut shortfalls = 0;
    for result in join_all(tasks).await {
        match result.expect("task panicked").expect("reserve failed") {
            ReserveOutcome::Reserved(r) => {
                assert_eq!(r.quantity(), 3);
                reserved += 1;
            }
            ReserveOutcome::Shortfall {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 3);
                assert!(available < 3);
                shortfalls += 1;
            }
        }
    }

    assert_eq!(reserved, 3);
    assert_eq!(shortfalls, 3);
    ctx.assert_stock(*wh.id(), type_id, 10, 9).await;
}

// 两条工单行抢最后一件：只有一家拿到
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn last_unit_goes_to_exactly_one_line() {
    let ctx = TestContext::new();
    let type_id = TypeComponentId::new();
    let wh = ctx.warehouse("WH-SHA-01", 0).await;
    ctx.intake(*wh.id(), type_id, 1).await;

    let case_a = ctx.open_case().await;
    let line_a = ctx.eligible_case_line(&case_a, type_id, 1).await;
    let case_b = ctx.open_case().await;
    let line_b = ctx.eligible_case_line(&case_b, type_id, 1).await;

    let handler = Arc::new(ctx.reservation_handler());
    let tasks: Vec<_> = [line_a, line_b]
        .iter()
        .map(|line| {
            let handler = Arc::clone(&handler);
            let cmd = ReservePartsCommand {
                user_id: ctx.user_id,
                case_line_id: *line.id(),
                warehouse_id: *wh.id(),
            };
            tokio::spawn(async move { handler.reserve(cmd).await })
        })
        .collect();

    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked").expect("reserve failed"))
        .collect();

    let won = outcomes
        .iter()
        .filter(|o| matches!(o, ReserveOutcome::Reserved(_)))
        .count();
    assert_eq!(won, 1);
    ctx.assert_stock(*wh.id(), type_id, 1, 1).await;
}
