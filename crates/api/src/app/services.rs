use std::sync::Arc;

use tracing::info;

use salesdesk_infra::{
    CommercialStore, InMemoryCommercialStore, OrderCompositionService, PostgresCommercialStore,
    PriceResolutionService, StoreConfig, TerritoryService,
};

/// Services shared by every handler.
pub struct AppServices {
    pub pricing: PriceResolutionService<dyn CommercialStore>,
    pub orders: OrderCompositionService<dyn CommercialStore>,
    pub territory: TerritoryService<dyn CommercialStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CommercialStore>) -> Self {
        Self {
            pricing: PriceResolutionService::new(Arc::clone(&store)),
            orders: OrderCompositionService::new(Arc::clone(&store)),
            territory: TerritoryService::new(store),
        }
    }
}

/// Open the configured store, creating the Postgres schema when needed.
pub async fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn CommercialStore>> {
    match config {
        StoreConfig::InMemory => {
            info!("using in-memory store");
            Ok(Arc::new(InMemoryCommercialStore::new()))
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresCommercialStore::connect(database_url, *max_connections).await?;
            store.migrate().await?;
            info!(max_connections, "using postgres store");
            Ok(Arc::new(store))
        }
    }
}
