//! Remote service paths and header names

pub const LOGIN_PATH: &str = "/data/validate-login";
pub const REFRESH_PATH: &str = "/auth/token/refresh";
pub const USER_DATA_PATH: &str = "/data/user-data/get";
pub const LIST_UPDATE_PATH: &str = "/data/shopping-lists/update";

pub const API_VERSION_HEADER: &str = "X-AnyLeaf-API-Version";
pub const CLIENT_ID_HEADER: &str = "X-AnyLeaf-Client-Identifier";
pub const SIGNED_USER_HEADER: &str = "X-AnyLeaf-Signed-User-ID";

/// Whether requests to `path` carry the session credential.
///
/// Every data path does except the login endpoint, which is what issues the
/// credential in the first place.
pub fn requires_session_credential(path: &str) -> bool {
    path.starts_with("/data/") && path != LOGIN_PATH
}
