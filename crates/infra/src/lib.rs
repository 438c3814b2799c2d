//! Infrastructure layer: record stores, configuration and the commercial
//! services built on top of them.

pub mod config;
pub mod services;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreConfig};
pub use services::{
    ComposeOrderRequest, OrderCompositionService, OrderDetails, OrderLineRequest,
    PriceResolutionService, ServiceError, ServiceResult, TerritoryService,
};
pub use store::{
    CommercialStore, InMemoryCommercialStore, PostgresCommercialStore, StoreError, StoreResult,
};
