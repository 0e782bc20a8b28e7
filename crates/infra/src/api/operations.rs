//! Encoding of list edits into the remote operation log format
//!
//! Every edit is a tagged operation carrying a fresh operation id and a
//! handler id naming its kind. Operations travel as a protobuf
//! `PbListOperationList` placed in the `operations` field of a URL-encoded
//! form.

use basket_domain::impl_wire_name_conversions;
use prost::Message;
use uuid::Uuid;

use super::proto::{PbListItem, PbListOperation, PbListOperationList, PbOperationMetadata};

/// Category assigned to items added by this client
pub const DEFAULT_CATEGORY: &str = "other";

/// Kind of edit, sent as the operation's handler id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    AddItem,
    RemoveItem,
    SetChecked,
}

impl_wire_name_conversions!(HandlerKind {
    AddItem => "add-shopping-list-item",
    RemoveItem => "remove-shopping-list-item",
    SetChecked => "set-list-item-checked",
});

/// Kind-specific data carried by an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationPayload {
    /// Full item record for a new item
    NewItem { name: String },
    /// Identifiers only
    Identifiers,
    /// Replacement value for a single field
    UpdatedValue(String),
}

/// One edit destined for a list's operation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    operation_id: String,
    handler: HandlerKind,
    list_id: String,
    item_id: String,
    user_id: String,
    payload: OperationPayload,
}

impl Operation {
    /// Add a new unchecked item; the item id is generated here.
    pub fn add_item(list_id: &str, name: &str, user_id: &str) -> Self {
        Self::new(
            HandlerKind::AddItem,
            list_id,
            &Uuid::new_v4().to_string(),
            user_id,
            OperationPayload::NewItem { name: name.to_string() },
        )
    }

    /// Remove an existing item.
    pub fn remove_item(list_id: &str, item_id: &str, user_id: &str) -> Self {
        Self::new(HandlerKind::RemoveItem, list_id, item_id, user_id, OperationPayload::Identifiers)
    }

    /// Set an item's checked flag.
    pub fn set_checked(list_id: &str, item_id: &str, checked: bool, user_id: &str) -> Self {
        let value = if checked { "y" } else { "n" };
        Self::new(
            HandlerKind::SetChecked,
            list_id,
            item_id,
            user_id,
            OperationPayload::UpdatedValue(value.to_string()),
        )
    }

    fn new(
        handler: HandlerKind,
        list_id: &str,
        item_id: &str,
        user_id: &str,
        payload: OperationPayload,
    ) -> Self {
        Self {
            operation_id: Uuid::new_v4().to_string(),
            handler,
            list_id: list_id.to_string(),
            item_id: item_id.to_string(),
            user_id: user_id.to_string(),
            payload,
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub const fn handler(&self) -> HandlerKind {
        self.handler
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub const fn payload(&self) -> &OperationPayload {
        &self.payload
    }

    /// Protobuf form of this operation.
    pub fn to_proto(&self) -> PbListOperation {
        let metadata = PbOperationMetadata {
            operation_id: self.operation_id.clone(),
            handler_id: self.handler.as_str().to_string(),
            user_id: self.user_id.clone(),
        };

        let mut op = PbListOperation {
            metadata: Some(metadata),
            list_id: self.list_id.clone(),
            list_item_id: self.item_id.clone(),
            ..PbListOperation::default()
        };

        match &self.payload {
            OperationPayload::NewItem { name } => {
                op.list_item = Some(PbListItem {
                    identifier: self.item_id.clone(),
                    list_id: self.list_id.clone(),
                    name: name.clone(),
                    checked: false,
                    user_id: self.user_id.clone(),
                    category_match_id: DEFAULT_CATEGORY.to_string(),
                    ..PbListItem::default()
                });
            }
            OperationPayload::Identifiers => {
                op.list_item = Some(PbListItem {
                    identifier: self.item_id.clone(),
                    list_id: self.list_id.clone(),
                    ..PbListItem::default()
                });
            }
            OperationPayload::UpdatedValue(value) => op.updated_value = value.clone(),
        }

        op
    }
}

/// Serialize operations into a `PbListOperationList` message.
pub fn encode_operations(operations: &[Operation]) -> Vec<u8> {
    PbListOperationList { operations: operations.iter().map(Operation::to_proto).collect() }
        .encode_to_vec()
}

/// Form body carrying the encoded operations in the `operations` field.
pub fn form_body(operations: &[Operation]) -> String {
    format!("operations={}", query_escape(&encode_operations(operations)))
}

/// Percent-encode raw bytes for a form value, with spaces written as `+`.
pub fn query_escape(bytes: &[u8]) -> String {
    urlencoding::encode_binary(bytes).replace("%20", "+")
}
