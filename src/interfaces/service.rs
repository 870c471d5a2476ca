use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::query_builder::{InterfaceQuery, Pagination, TimeRange};
use super::summary::{self, Summary};
use super::{InterfaceRecord, InterfaceUpdate, NewInterfaceRecord};
use crate::configuration::types::QueryConfig;
use crate::error_handling::types::ServiceError;
use crate::storage::Storage;

/// One page of records plus the metadata needed to page further.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceList {
    pub interfaces: Vec<InterfaceRecord>,
    pub pagination: Pagination,
}

/// Request-level operations over a shared record store.
#[derive(Clone)]
pub struct InterfaceService {
    storage: Arc<dyn Storage>,
    query_config: QueryConfig,
}

/// Path ids that are not UUIDs cannot name a record.
fn parse_id(id: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(id).map_err(|_| ServiceError::NotFound)
}

impl InterfaceService {
    pub fn new(storage: Arc<dyn Storage>, query_config: QueryConfig) -> Self {
        Self {
            storage,
            query_config,
        }
    }

    /// Filtered, sorted page of records. The total is counted over the whole
    /// filter, independent of the page window.
    pub async fn list(&self, params: &HashMap<String, String>) -> Result<InterfaceList, ServiceError> {
        let query = InterfaceQuery::from_params(params, &self.query_config, Utc::now())?;
        debug!("Listing interfaces with {:?}", query);

        let interfaces = self
            .storage
            .find_interfaces(&query.filter, query.sort, query.skip(), query.limit)
            .await?;
        let total = self.storage.count_interfaces(&query.filter).await?;

        Ok(InterfaceList {
            interfaces,
            pagination: Pagination::new(query.page, query.limit, total),
        })
    }

    pub async fn summary(&self, time_range: Option<&str>) -> Result<Summary, ServiceError> {
        let range = TimeRange::parse_or_default(time_range);
        Ok(summary::summarize(self.storage.as_ref(), range, Utc::now()).await?)
    }

    pub async fn get(&self, id: &str) -> Result<InterfaceRecord, ServiceError> {
        let id = parse_id(id)?;
        self.storage
            .get_interface(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn create(&self, body: Value) -> Result<InterfaceRecord, ServiceError> {
        let record = NewInterfaceRecord::from_json(body)?.into_record(Uuid::new_v4(), Utc::now());
        self.storage.insert_interface(&record).await?;
        info!(
            "Recorded {} execution of {} ({})",
            record.status, record.interface_name, record.id
        );
        Ok(record)
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<InterfaceRecord, ServiceError> {
        let id = parse_id(id)?;
        let update = InterfaceUpdate::from_json(body)?;
        let updated = self
            .storage
            .update_interface(id, &update, Utc::now())
            .await?
            .ok_or(ServiceError::NotFound)?;
        debug!("Updated interface {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        if self.storage.delete_interface(id).await? {
            info!("Deleted interface {}", id);
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }
}
