//! Site URL settings (`/_api/v3/app-settings`).

use axum::extract::State;
use domain::models::SiteUrlParams;
use domain::services::settings::{load_site_url, save_site_url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ApiV3};
use crate::extractors::fields::validate_site_url_value;
use crate::extractors::ApiJson;

/// The stored site URL next to the one set by `APP_SITE_URL`.
///
/// GET /_api/v3/app-settings/site-url
pub async fn get_site_url(State(state): State<AppState>) -> ApiResult<SiteUrlParams> {
    let site_url = load_site_url(state.settings.as_ref()).await.map_err(|e| {
        ApiError::directory_failure(
            "get-siteUrlSetting-failed",
            "Error occurred in getting site url setting",
            &e,
        )
    })?;

    Ok(ApiV3(SiteUrlParams {
        site_url,
        env_site_url: state.config.env_site_url(),
    }))
}

/// Body of `PUT /site-url-setting`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SiteUrlSettingParams {
    #[validate(required, custom(function = "validate_site_url_value"))]
    pub site_url: Option<Value>,
}

impl SiteUrlSettingParams {
    /// The trimmed URL; empty when the setting is cleared.
    fn site_url(&self) -> &str {
        self.site_url
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSiteUrl {
    pub site_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteUrlSettingResponse {
    pub site_url_setting_params: StoredSiteUrl,
}

/// Store the site URL. An empty value clears it.
///
/// PUT /_api/v3/app-settings/site-url-setting
pub async fn update_site_url(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<SiteUrlSettingParams>,
) -> ApiResult<SiteUrlSettingResponse> {
    params.validate()?;

    let stored = save_site_url(state.settings.as_ref(), params.site_url())
        .await
        .map_err(|e| {
            ApiError::directory_failure(
                "update-siteUrlSetting-failed",
                "Error occurred in updating site url setting",
                &e,
            )
        })?;

    info!(site_url = ?stored, "Site URL updated");
    Ok(ApiV3(SiteUrlSettingResponse {
        site_url_setting_params: StoredSiteUrl { site_url: stored },
    }))
}
