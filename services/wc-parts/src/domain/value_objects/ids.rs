//! 强类型 ID 定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
        #[display("{_0}")]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

typed_id!(
    /// 仓库 ID
    WarehouseId
);

typed_id!(
    /// 配件类型 ID
    TypeComponentId
);

typed_id!(
    /// 库存行 ID（仓库 × 配件类型）
    StockLineId
);

typed_id!(
    /// 工单行预留 ID
    ReservationId
);

typed_id!(
    /// 调拨预留 ID
    StockReservationId
);

typed_id!(
    /// 调拨申请 ID
    TransferRequestId
);

typed_id!(
    /// 调拨申请行项 ID
    TransferItemId
);

typed_id!(
    /// 物理配件 ID
    ComponentId
);

typed_id!(
    /// 工单行 ID
    CaseLineId
);

typed_id!(
    /// 保修工单 ID
    GuaranteeCaseId
);

typed_id!(
    /// 任务指派 ID
    TaskAssignmentId
);
