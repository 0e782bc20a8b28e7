//! Conversions from external infrastructure errors into domain errors.

use basket_domain::SyncError;
use prost::DecodeError as ProtoError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SyncError);

impl From<InfraError> for SyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SyncError> for InfraError {
    fn from(value: SyncError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSyncError {
    fn into_sync(self) -> SyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SyncError */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for HttpError {
    fn into_sync(self) -> SyncError {
        if self.is_timeout() {
            return SyncError::Transport("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return SyncError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return SyncError::Decode(format!("failed to read response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SyncError::Auth(message),
                _ => SyncError::Transport(message),
            };
        }

        SyncError::Transport(format!("HTTP client error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* prost::DecodeError → SyncError::Decode */
/* -------------------------------------------------------------------------- */

impl IntoSyncError for ProtoError {
    fn into_sync(self) -> SyncError {
        SyncError::Decode(format!("malformed protobuf message: {self}"))
    }
}

impl From<ProtoError> for InfraError {
    fn from(value: ProtoError) -> Self {
        Self(value.into_sync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
