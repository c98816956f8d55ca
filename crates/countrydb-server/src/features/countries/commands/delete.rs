use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{CountryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCountryCommand {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteCountryError {
    #[error("Country '{0}' not found")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<(), DeleteCountryError>> for DeleteCountryCommand {}

/// Delete the country whose name matches, ignoring case
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn CountryStore>,
    command: DeleteCountryCommand,
) -> Result<(), DeleteCountryError> {
    if store.delete_by_name(&command.name).await? {
        Ok(())
    } else {
        Err(DeleteCountryError::NotFound(command.name))
    }
}
