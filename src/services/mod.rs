//! Business logic services

pub mod possession;

use std::sync::Arc;

use crate::{config::LoansConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub possession: possession::PossessionService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans_config: LoansConfig) -> Self {
        let borrowers = Arc::new(repository.borrowers.clone());
        Self {
            possession: possession::PossessionService::new(repository, borrowers, loans_config),
        }
    }
}
