//! Protobuf messages exchanged with the remote list service.
//!
//! Only the fields the client reads or writes are declared; prost skips
//! unknown fields on decode, so the remaining schema can be ignored. The
//! messages use proto3 semantics: default values (empty strings, `false`)
//! are not written to the wire.

use prost::Message;

/// Metadata attached to every operation in the remote operation log.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbOperationMetadata {
    #[prost(string, tag = "1")]
    pub operation_id: String,
    #[prost(string, tag = "2")]
    pub handler_id: String,
    #[prost(string, tag = "3")]
    pub user_id: String,
}

/// One item as the service stores it.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbListItem {
    #[prost(string, tag = "1")]
    pub identifier: String,
    #[prost(string, tag = "3")]
    pub list_id: String,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "6")]
    pub details: String,
    #[prost(bool, tag = "7")]
    pub checked: bool,
    #[prost(string, tag = "13")]
    pub user_id: String,
    #[prost(string, tag = "14")]
    pub category_match_id: String,
}

/// A single tagged edit appended to a list's operation log.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbListOperation {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<PbOperationMetadata>,
    #[prost(string, tag = "2")]
    pub list_id: String,
    #[prost(string, tag = "3")]
    pub list_item_id: String,
    #[prost(string, tag = "4")]
    pub updated_value: String,
    #[prost(message, optional, tag = "6")]
    pub list_item: Option<PbListItem>,
}

/// Request body of the mutation endpoint.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbListOperationList {
    #[prost(message, repeated, tag = "1")]
    pub operations: Vec<PbListOperation>,
}

/// A shopping list with its items.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbShoppingList {
    #[prost(string, tag = "1")]
    pub identifier: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(message, repeated, tag = "4")]
    pub items: Vec<PbListItem>,
}

/// Shopping-list section of the user data response.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbShoppingListsResponse {
    #[prost(message, repeated, tag = "1")]
    pub new_lists: Vec<PbShoppingList>,
    #[prost(message, repeated, tag = "2")]
    pub modified_lists: Vec<PbShoppingList>,
}

/// Response body of the user-data endpoint.
#[derive(Clone, PartialEq, Eq, Message)]
pub struct PbUserDataResponse {
    #[prost(message, optional, tag = "1")]
    pub shopping_lists_response: Option<PbShoppingListsResponse>,
}

impl PbUserDataResponse {
    /// Every shopping list in the response, in wire order.
    pub fn shopping_lists(&self) -> impl Iterator<Item = &PbShoppingList> {
        self.shopping_lists_response
            .iter()
            .flat_map(|resp| resp.new_lists.iter().chain(resp.modified_lists.iter()))
    }
}
