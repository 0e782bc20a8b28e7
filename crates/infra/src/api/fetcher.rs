use basket_domain::{ListItem, ListSnapshot, Result, SyncError};
use prost::Message;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use super::endpoints::USER_DATA_PATH;
use super::proto::{PbShoppingList, PbUserDataResponse};
use super::transport::AuthenticatedTransport;
use crate::errors::InfraError;

/// Downloads the user's data and projects it onto list snapshots
#[derive(Clone)]
pub struct ListFetcher {
    transport: AuthenticatedTransport,
}

impl ListFetcher {
    pub const fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    /// Fetch the raw user data blob.
    ///
    /// # Errors
    /// `Auth` on 401/403, `Transport` on any other non-2xx status or network
    /// failure, `Decode` if the body is not a valid user data message.
    #[instrument(skip(self))]
    pub async fn fetch_user_data(&self) -> Result<PbUserDataResponse> {
        let response = self.transport.post_empty(USER_DATA_PATH).await?;
        let status = response.status();

        if !status.is_success() {
            warn!(%status, "user data request failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SyncError::Auth(format!("user data request rejected with status {status}"))
                }
                _ => SyncError::Transport(format!("user data request failed with status {status}")),
            });
        }

        let body = self.transport.read_body(response).await?;
        debug!(bytes = body.len(), "user data received");
        PbUserDataResponse::decode(body.as_slice()).map_err(|e| InfraError::from(e).into())
    }

    /// Snapshot of the list whose name equals `name` exactly.
    pub async fn fetch_list(&self, name: &str) -> Result<ListSnapshot> {
        let data = self.fetch_user_data().await?;
        select_list(&data, name)
    }

    /// Snapshots of every list in the user data.
    pub async fn fetch_lists(&self) -> Result<Vec<ListSnapshot>> {
        let data = self.fetch_user_data().await?;
        Ok(data.shopping_lists().map(to_snapshot).collect())
    }
}

/// Pick the first list named `name`, searching new lists before modified ones.
///
/// # Errors
/// Returns `SyncError::NotFound` when no list has that exact name.
pub fn select_list(data: &PbUserDataResponse, name: &str) -> Result<ListSnapshot> {
    data.shopping_lists()
        .find(|list| list.name == name)
        .map(to_snapshot)
        .ok_or_else(|| SyncError::NotFound(format!("list {name:?} not present in user data")))
}

/// Project a wire list onto a snapshot, preserving item order.
pub fn to_snapshot(list: &PbShoppingList) -> ListSnapshot {
    ListSnapshot {
        id: list.identifier.clone(),
        name: list.name.clone(),
        items: list
            .items
            .iter()
            .map(|item| ListItem {
                id: item.identifier.clone(),
                name: item.name.clone(),
                details: item.details.clone(),
                checked: item.checked,
            })
            .collect(),
    }
}
