//! Application state shared by handlers

use std::sync::Arc;

use crate::domain::DomainError;
use crate::infrastructure::services::CatalogService;

use super::types::ApiError;

/// Application state; cheap to clone per request
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    /// Include internal error messages in 5xx responses
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogService>) -> Self {
        Self {
            catalog,
            expose_error_details: false,
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    /// Converts a domain error honouring the detail-exposure setting
    pub fn api_error(&self, err: DomainError) -> ApiError {
        ApiError::from_domain(err, self.expose_error_details)
    }
}
