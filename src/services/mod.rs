//! Business logic services

pub mod catalog;
pub mod reservations;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub reservations: reservations::ReservationsService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository),
        }
    }
}
