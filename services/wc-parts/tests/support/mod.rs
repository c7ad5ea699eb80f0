//! 集成测试公共设施：内存存储上的全套处理器与造数辅助

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use domain_core::Entity;
use errors::AppResult;
use ports::NotificationDispatcher;
use tokio::sync::Mutex;

use wc_parts::application::commands::*;
use wc_parts::application::{
    AssignmentHandler, CaseLineHandler, InventoryHandler, ReservationHandler, TransferHandler,
};
use wc_parts::domain::entities::{CaseLine, GuaranteeCase, Warehouse};
use wc_parts::domain::enums::WarrantyStatus;
use wc_parts::domain::unit_of_work::UnitOfWorkFactory;
use wc_parts::domain::value_objects::{TypeComponentId, Vin, WarehouseId};
use wc_parts::infrastructure::persistence::{MemoryInventoryQueryRepository, MemoryStore};

/// 记录派发的每条通知，供断言用
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingNotifier {
    pub async fn topics(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    pub async fn payloads_for(&self, topic: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn dispatch(
        &self,
        topic: &str,
        _recipients: &[UserId],
        payload: serde_json::Value,
    ) -> AppResult<()> {
        self.events.lock().await.push((topic.to_string(), payload));
        Ok(())
    }
}

pub struct TestContext {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub inventory: InventoryHandler,
    pub reservations: ReservationHandler,
    pub transfers: TransferHandler,
    pub case_lines: CaseLineHandler,
    pub assignments: AssignmentHandler,
    pub user_id: UserId,
}

impl TestContext {
    pub fn new() -> Self {
        telemetry::try_init_tracing("info");

        let store = MemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let factory: Arc<dyn UnitOfWorkFactory> = Arc::new(store.clone());
        let query_repo = Arc::new(MemoryInventoryQueryRepository::new(store.clone()));

        Self {
            inventory: InventoryHandler::new(factory.clone(), query_repo),
            reservations: ReservationHandler::new(factory.clone(), notifier.clone()),
            transfers: TransferHandler::new(factory.clone(), notifier.clone()),
            case_lines: CaseLineHandler::new(factory.clone(), notifier.clone()),
            assignments: AssignmentHandler::new(factory, notifier.clone()),
            store,
            notifier,
            user_id: UserId::new(),
        }
    }

    /// 独立预留处理器，与现有上下文共享同一份存储
    pub fn reservation_handler(&self) -> ReservationHandler {
        ReservationHandler::new(Arc::new(self.store.clone()), self.notifier.clone())
    }

    /// 登记仓库
    pub async fn warehouse(&self, code: &str, priority: i32) -> Warehouse {
        self.inventory
            .register_warehouse(RegisterWarehouseCommand {
                user_id: self.user_id,
                code: code.to_string(),
                name: format!("仓库 {}", code),
                priority,
            })
            .await
            .expect("register warehouse")
    }

    /// 无序列号入库
    pub async fn intake(&self, warehouse_id: WarehouseId, type_id: TypeComponentId, qty: i64) {
        self.inventory
            .stock_intake(StockIntakeCommand {
                user_id: self.user_id,
                warehouse_id,
                type_component_id: type_id,
                quantity: qty,
                serial_numbers: Vec::new(),
                reason: "采购入库".to_string(),
            })
            .await
            .expect("stock intake");
    }

    /// 带序列号入库
    pub async fn intake_serialized(
        &self,
        warehouse_id: WarehouseId,
        type_id: TypeComponentId,
        serials: &[&str],
    ) {
        self.inventory
            .stock_intake(StockIntakeCommand {
                user_id: self.user_id,
                warehouse_id,
                type_component_id: type_id,
                quantity: serials.len() as i64,
                serial_numbers: serials.iter().map(|s| s.to_string()).collect(),
                reason: "采购入库".to_string(),
            })
            .await
            .expect("serialized stock intake");
    }

    /// 开保修工单
    pub async fn open_case(&self) -> GuaranteeCase {
        self.case_lines
            .open_case(OpenCaseCommand {
                user_id: self.user_id,
                vin: test_vin(),
            })
            .await
            .expect("open case")
    }

    /// 建工单行（需换件）
    pub async fn case_line(
        &self,
        case: &GuaranteeCase,
        type_id: TypeComponentId,
        qty: i64,
    ) -> CaseLine {
        self.case_lines
            .create_case_line(CreateCaseLineCommand {
                user_id: self.user_id,
                guarantee_case_id: *case.id(),
                diagnosis_text: "电池模组电压异常".to_string(),
                type_component_id: Some(type_id),
                quantity_needed: qty,
            })
            .await
            .expect("create case line")
    }

    /// 建行并裁定在保，直接可预留
    pub async fn eligible_case_line(
        &self,
        case: &GuaranteeCase,
        type_id: TypeComponentId,
        qty: i64,
    ) -> CaseLine {
        let line = self.case_line(case, type_id, qty).await;
        self.case_lines
            .set_warranty_status(SetWarrantyStatusCommand {
                user_id: self.user_id,
                case_line_id: *line.id(),
                warranty_status: WarrantyStatus::Eligible,
            })
            .await
            .expect("approve warranty")
    }
}

impl TestContext {
    /// 直读库存行快照
    pub async fn stock_line(
        &self,
        warehouse_id: WarehouseId,
        type_id: TypeComponentId,
    ) -> wc_parts::domain::entities::StockLine {
        let mut uow = self.store.begin().await.expect("begin uow");
        uow.lock_stock_line(warehouse_id, type_id)
            .await
            .expect("stock line exists")
    }

    /// 库存行不存在或三量核对
    pub async fn assert_stock(
        &self,
        warehouse_id: WarehouseId,
        type_id: TypeComponentId,
        in_stock: i64,
        reserved: i64,
    ) {
        let line = self.stock_line(warehouse_id, type_id).await;
        assert_eq!(line.quantity_in_stock(), in_stock, "quantity_in_stock");
        assert_eq!(line.quantity_reserved(), reserved, "quantity_reserved");
        assert_eq!(
            line.quantity_available(),
            in_stock - reserved,
            "quantity_available"
        );
    }
}

pub fn test_vin() -> Vin {
    Vin::new("LRWYGCFS5PC123456").expect("valid vin")
}

pub fn technician() -> UserId {
    UserId::new()
}
