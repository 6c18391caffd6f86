//! Gateway-identity extractor for Axum handlers.
//!
//! Authentication itself lives in the fronting gateway; by the time a
//! request reaches this service the gateway has attached trusted
//! identity headers. Use [`Identity`] as an extractor parameter in any
//! handler that needs to know who is calling and from which device:
//!
//! ```ignore
//! async fn my_handler(identity: Identity) -> AppResult<Json<()>> {
//!     tracing::info!(user_id = identity.user_id, "handling request");
//!     Ok(Json(()))
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use hearth_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// The identity headers set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const DISPLAY_NAME_HEADER: &str = "x-display-name";

/// Caller identity extracted from gateway headers.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The user's database id (from `x-user-id`).
    pub user_id: DbId,
    /// The persisted identifier of the connecting device (from
    /// `x-device-id`). Absent on first load, before the client has
    /// resolved one; owner-device comparisons then never match.
    pub device_id: Option<String>,
    /// Display name for user-row materialization (from `x-display-name`).
    pub display_name: String,
}

impl Identity {
    /// Parse the identity headers out of a header map.
    ///
    /// Shared with the WebSocket upgrade path, which cannot use the
    /// extractor directly.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("Missing x-user-id header".into()))?
            .parse::<DbId>()
            .map_err(|_| AppError::Unauthenticated("x-user-id must be an integer".into()))?;

        let device_id = headers
            .get(DEVICE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let display_name = headers
            .get(DISPLAY_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .unwrap_or("Roommate")
            .to_string();

        Ok(Self {
            user_id,
            device_id,
            display_name,
        })
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
