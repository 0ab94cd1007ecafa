//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{CheckoutStore, StoreHealth};
use crate::services::{
    AuthorizationGate, CheckoutSheetService, ChecklistAnnotationStore, EvidenceStore,
    SequenceAllocator,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub store_health: Arc<dyn StoreHealth>,
    pub sequences: SequenceAllocator,
    pub sheets: CheckoutSheetService,
    pub annotations: ChecklistAnnotationStore,
    pub evidence: EvidenceStore,
    pub gate: AuthorizationGate,
}

impl AppState {
    /// Conectar todos los servicios al mismo backend de almacenamiento
    pub fn new<S: CheckoutStore>(store: Arc<S>, config: EnvironmentConfig) -> Self {
        let settings = config.service_settings();
        let attempts = settings.read_retry_attempts;

        let evidence = EvidenceStore::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            settings,
        );

        Self {
            store_health: store.clone(),
            sequences: SequenceAllocator::new(store.clone()),
            sheets: CheckoutSheetService::new(store.clone(), store.clone(), attempts),
            annotations: ChecklistAnnotationStore::new(
                store.clone(),
                store.clone(),
                store.clone(),
                attempts,
            ),
            gate: AuthorizationGate::new(
                store.clone(),
                store.clone(),
                store,
                evidence.clone(),
                attempts,
            ),
            evidence,
            config: Arc::new(config),
        }
    }
}
