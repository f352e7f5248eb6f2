use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiKeySummaryData;
use crate::domain::auth::models::Identity;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn list_api_keys(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<Vec<ApiKeySummaryData>>, ApiError> {
    state
        .api_key_service
        .list(&identity)
        .await
        .map_err(ApiError::from)
        .map(|keys| {
            ApiSuccess::new(
                StatusCode::OK,
                keys.iter().map(ApiKeySummaryData::from).collect(),
            )
        })
}
