//! Shared fixtures for infra integration tests.
//!
//! `FakeListService` is an in-memory stand-in for the remote list service
//! mounted on a wiremock server. It implements the four endpoints the client
//! uses, applies received operations to its own lists, and enforces the
//! authentication rules: signed-user or bearer credentials on data paths, and
//! single-use refresh tokens.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use basket_domain::ServiceConfig;
use basket_infra::api::endpoints::{
    LIST_UPDATE_PATH, LOGIN_PATH, REFRESH_PATH, SIGNED_USER_HEADER, USER_DATA_PATH,
};
use basket_infra::api::proto::{
    PbListItem, PbListOperation, PbListOperationList, PbShoppingList, PbShoppingListsResponse,
    PbUserDataResponse,
};
use prost::Message;
use tracing::subscriber::DefaultGuard;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const EMAIL: &str = "shopper@example.com";
pub const PASSWORD: &str = "correct horse";
pub const SIGNED_USER_ID: &str = "signed-u1";
pub const USER_ID: &str = "u1";
pub const INITIAL_REFRESH_TOKEN: &str = "rt-0";

#[derive(Default)]
struct ServiceState {
    lists: Vec<PbShoppingList>,
    /// Refresh tokens that may still be exchanged, each exactly once
    live_refresh_tokens: HashSet<String>,
    access_token: Option<String>,
    issued: u32,
    /// Decoded operations in the order they were received
    operations: Vec<PbListOperation>,
    /// Tokens presented after they had already been exchanged
    replayed_tokens: Vec<String>,
    user_data_fetches: u32,
    /// When set, data endpoints answer with this status
    outage: Option<u16>,
}

/// Fake list service backed by a wiremock server
#[derive(Clone)]
pub struct FakeListService {
    pub server: Arc<MockServer>,
    state: Arc<Mutex<ServiceState>>,
}

impl FakeListService {
    /// Start a server holding a "Groceries" list (L1) with one unchecked
    /// item "Milk" (i1).
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(ServiceState {
            lists: vec![shopping_list("L1", "Groceries", &[("i1", "Milk", false)])],
            live_refresh_tokens: HashSet::from([INITIAL_REFRESH_TOKEN.to_string()]),
            ..ServiceState::default()
        }));

        let service = Self { server: Arc::new(server), state };
        service.mount().await;
        service
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig { base_url: self.server.uri(), ..ServiceConfig::default() }
    }

    async fn mount(&self) {
        for (route, endpoint) in [
            (LOGIN_PATH, Endpoint::Login),
            (REFRESH_PATH, Endpoint::Refresh),
            (USER_DATA_PATH, Endpoint::UserData),
            (LIST_UPDATE_PATH, Endpoint::Update),
        ] {
            Mock::given(method("POST"))
                .and(path(route))
                .respond_with(Responder { endpoint, state: Arc::clone(&self.state) })
                .mount(&self.server)
                .await;
        }
    }

    /// Replace the server's lists wholesale.
    pub fn set_lists(&self, lists: Vec<PbShoppingList>) {
        self.lock().lists = lists;
    }

    /// Add an item server-side, as another device would.
    pub fn add_remote_item(&self, list_id: &str, item_id: &str, name: &str) {
        let mut state = self.lock();
        if let Some(list) = state.lists.iter_mut().find(|l| l.identifier == list_id) {
            list.items.push(list_item(list_id, item_id, name, false));
        }
    }

    /// Make data endpoints fail with `status` until cleared with `None`.
    pub fn set_outage(&self, status: Option<u16>) {
        self.lock().outage = status;
    }

    pub fn operations(&self) -> Vec<PbListOperation> {
        self.lock().operations.clone()
    }

    pub fn user_data_fetches(&self) -> u32 {
        self.lock().user_data_fetches
    }

    pub fn replayed_tokens(&self) -> Vec<String> {
        self.lock().replayed_tokens.clone()
    }

    /// Issue an extra refresh token, as a fresh login on another device would.
    pub fn grant_refresh_token(&self, token: &str) {
        self.lock().live_refresh_tokens.insert(token.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServiceState> {
        self.state.lock().expect("fake service state poisoned")
    }
}

#[derive(Clone, Copy)]
enum Endpoint {
    Login,
    Refresh,
    UserData,
    Update,
}

struct Responder {
    endpoint: Endpoint,
    state: Arc<Mutex<ServiceState>>,
}

impl Respond for Responder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().expect("fake service state poisoned");
        match self.endpoint {
            Endpoint::Login => login(request),
            Endpoint::Refresh => refresh(&mut state, request),
            Endpoint::UserData => {
                if let Some(rejection) = reject(&state, request) {
                    return rejection;
                }
                state.user_data_fetches += 1;
                let body = PbUserDataResponse {
                    shopping_lists_response: Some(PbShoppingListsResponse {
                        new_lists: state.lists.clone(),
                        modified_lists: Vec::new(),
                    }),
                }
                .encode_to_vec();
                ResponseTemplate::new(200).set_body_bytes(body)
            }
            Endpoint::Update => {
                if let Some(rejection) = reject(&state, request) {
                    return rejection;
                }
                let form = parse_form(&request.body);
                let Some(raw) = form.get("operations") else {
                    return ResponseTemplate::new(400).set_body_string("missing operations");
                };
                let Ok(batch) = PbListOperationList::decode(raw.as_slice()) else {
                    return ResponseTemplate::new(400).set_body_string("malformed operations");
                };
                for op in batch.operations {
                    apply(&mut state.lists, &op);
                    state.operations.push(op);
                }
                ResponseTemplate::new(200)
            }
        }
    }
}

fn login(request: &Request) -> ResponseTemplate {
    let form = parse_form(&request.body);
    let field = |key: &str| form.get(key).map(|v| String::from_utf8_lossy(v).into_owned());

    if field("email").as_deref() == Some(EMAIL) && field("password").as_deref() == Some(PASSWORD) {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "signed_user_id": SIGNED_USER_ID,
            "user_id": USER_ID,
        }))
    } else {
        ResponseTemplate::new(401).set_body_string("invalid credentials")
    }
}

fn refresh(state: &mut ServiceState, request: &Request) -> ResponseTemplate {
    let form = parse_form(&request.body);
    let token = form.get("refresh_token").map(|v| String::from_utf8_lossy(v).into_owned());

    match token {
        Some(token) if state.live_refresh_tokens.remove(&token) => {
            state.issued += 1;
            let refresh_token = format!("rt-{}", state.issued);
            let access_token = format!("at-{}", state.issued);
            state.live_refresh_tokens.insert(refresh_token.clone());
            state.access_token = Some(access_token.clone());
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "refresh_token": refresh_token,
                "access_token": access_token,
            }))
        }
        Some(token) => {
            state.replayed_tokens.push(token);
            ResponseTemplate::new(401).set_body_string("refresh token revoked")
        }
        None => ResponseTemplate::new(400).set_body_string("missing refresh_token"),
    }
}

/// Authorization check shared by the data endpoints.
fn reject(state: &ServiceState, request: &Request) -> Option<ResponseTemplate> {
    if let Some(status) = state.outage {
        return Some(ResponseTemplate::new(status));
    }

    let header = |name: &str| request.headers.get(name).and_then(|v| v.to_str().ok());
    let signed_user_ok = header(SIGNED_USER_HEADER) == Some(SIGNED_USER_ID);
    let bearer_ok = match (&state.access_token, header("authorization")) {
        (Some(token), Some(value)) => value == format!("Bearer {token}"),
        _ => false,
    };

    if signed_user_ok || bearer_ok {
        None
    } else {
        Some(ResponseTemplate::new(401).set_body_string("not signed in"))
    }
}

fn apply(lists: &mut [PbShoppingList], op: &PbListOperation) {
    let handler = op.metadata.as_ref().map(|m| m.handler_id.as_str()).unwrap_or_default();
    let Some(list) = lists.iter_mut().find(|l| l.identifier == op.list_id) else {
        return;
    };

    match handler {
        "add-shopping-list-item" => {
            if let Some(item) = &op.list_item {
                list.items.push(item.clone());
            }
        }
        "remove-shopping-list-item" => list.items.retain(|i| i.identifier != op.list_item_id),
        "set-list-item-checked" => {
            if let Some(item) = list.items.iter_mut().find(|i| i.identifier == op.list_item_id) {
                item.checked = op.updated_value == "y";
            }
        }
        _ => {}
    }
}

/// Decode an `application/x-www-form-urlencoded` body into raw byte values.
pub fn parse_form(body: &[u8]) -> HashMap<String, Vec<u8>> {
    let text = String::from_utf8_lossy(body);
    text.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let decode = |s: &str| urlencoding::decode_binary(s.replace('+', " ").as_bytes()).into_owned();
            Some((String::from_utf8_lossy(&decode(key)).into_owned(), decode(value)))
        })
        .collect()
}

pub fn list_item(list_id: &str, item_id: &str, name: &str, checked: bool) -> PbListItem {
    PbListItem {
        identifier: item_id.to_string(),
        list_id: list_id.to_string(),
        name: name.to_string(),
        checked,
        ..PbListItem::default()
    }
}

pub fn shopping_list(id: &str, name: &str, items: &[(&str, &str, bool)]) -> PbShoppingList {
    PbShoppingList {
        identifier: id.to_string(),
        name: name.to_string(),
        items: items
            .iter()
            .map(|(item_id, item_name, checked)| list_item(id, item_id, item_name, *checked))
            .collect(),
    }
}

/// Captured formatted log output for the current thread.
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().expect("log buffer poisoned")).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route tracing output on this thread into a buffer until the capture is
/// dropped. Only reliable on a current-thread runtime.
pub fn capture_logs() -> LogCapture {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || BufferWriter(Arc::clone(&writer)))
        .finish();

    LogCapture { buffer, _guard: tracing::subscriber::set_default(subscriber) }
}
