//! Customize "function" settings (`/_api/v3/customize-setting/function`).

use axum::extract::State;
use domain::models::CustomizeFunctionParams;
use domain::services::settings::{load_customize_params, save_customize_params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult, ApiV3};
use crate::extractors::fields::{
    flag_value, positive_int_value, validate_flag, validate_page_list_limit,
};
use crate::extractors::ApiJson;

const UPDATE_FAILED: &str = "update-customizeSetting-failed";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizeParamsResponse {
    pub customize_params: CustomizeFunctionParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizedParamsResponse {
    pub customized_params: CustomizeFunctionParams,
}

/// GET /_api/v3/customize-setting/function
pub async fn get_function_settings(
    State(state): State<AppState>,
) -> ApiResult<CustomizeParamsResponse> {
    let customize_params = load_customize_params(state.settings.as_ref())
        .await
        .map_err(|e| {
            ApiError::directory_failure(
                "get-customizeSetting-failed",
                "Error occurred in getting customize setting",
                &e,
            )
        })?;

    Ok(ApiV3(CustomizeParamsResponse { customize_params }))
}

/// Body of `PUT /function`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSettingsParams {
    #[validate(required, custom(function = "validate_flag"))]
    pub is_enabled_timeline: Option<Value>,
    #[validate(required, custom(function = "validate_flag"))]
    pub is_saved_states_of_tab_changes: Option<Value>,
    #[validate(required, custom(function = "validate_flag"))]
    pub is_enabled_attach_title_header: Option<Value>,
    #[serde(rename = "pageLimitationS")]
    #[validate(required, custom(function = "validate_page_list_limit"))]
    pub page_limitation_s: Option<Value>,
    #[serde(rename = "pageLimitationM")]
    #[validate(required, custom(function = "validate_page_list_limit"))]
    pub page_limitation_m: Option<Value>,
    #[serde(rename = "pageLimitationL")]
    #[validate(required, custom(function = "validate_page_list_limit"))]
    pub page_limitation_l: Option<Value>,
    #[serde(rename = "pageLimitationXL")]
    #[validate(required, custom(function = "validate_page_list_limit"))]
    pub page_limitation_xl: Option<Value>,
    #[validate(required, custom(function = "validate_flag"))]
    pub is_enabled_stale_notification: Option<Value>,
    #[validate(required, custom(function = "validate_flag"))]
    pub is_all_reply_shown: Option<Value>,
}

fn flag(value: Option<&Value>) -> bool {
    value.and_then(flag_value).unwrap_or_default()
}

fn limit(value: Option<&Value>) -> u32 {
    value.and_then(positive_int_value).unwrap_or_default()
}

impl TryFrom<FunctionSettingsParams> for CustomizeFunctionParams {
    type Error = ApiError;

    fn try_from(p: FunctionSettingsParams) -> Result<Self, Self::Error> {
        p.validate()?;

        Ok(CustomizeFunctionParams {
            is_enabled_timeline: flag(p.is_enabled_timeline.as_ref()),
            is_saved_states_of_tab_changes: flag(p.is_saved_states_of_tab_changes.as_ref()),
            is_enabled_attach_title_header: flag(p.is_enabled_attach_title_header.as_ref()),
            page_limitation_s: limit(p.page_limitation_s.as_ref()),
            page_limitation_m: limit(p.page_limitation_m.as_ref()),
            page_limitation_l: limit(p.page_limitation_l.as_ref()),
            page_limitation_xl: limit(p.page_limitation_xl.as_ref()),
            is_enabled_stale_notification: flag(p.is_enabled_stale_notification.as_ref()),
            is_all_reply_shown: flag(p.is_all_reply_shown.as_ref()),
        })
    }
}

/// PUT /_api/v3/customize-setting/function
pub async fn update_function_settings(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<FunctionSettingsParams>,
) -> ApiResult<CustomizedParamsResponse> {
    let params = CustomizeFunctionParams::try_from(params)?;

    save_customize_params(state.settings.as_ref(), &params)
        .await
        .map_err(|e| {
            ApiError::directory_failure(
                UPDATE_FAILED,
                "Error occurred in updating customize setting",
                &e,
            )
        })?;

    info!(?params, "Customize function settings updated");
    Ok(ApiV3(CustomizedParamsResponse {
        customized_params: params,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_body() -> Value {
        json!({
            "isEnabledTimeline": false,
            "isSavedStatesOfTabChanges": true,
            "isEnabledAttachTitleHeader": true,
            "pageLimitationS": 10,
            "pageLimitationM": 30,
            "pageLimitationL": 50,
            "pageLimitationXL": "50",
            "isEnabledStaleNotification": false,
            "isAllReplyShown": true
        })
    }

    #[test]
    fn test_params_from_full_body() {
        let raw: FunctionSettingsParams = serde_json::from_value(full_body()).unwrap();
        let params = CustomizeFunctionParams::try_from(raw).unwrap();

        assert!(!params.is_enabled_timeline);
        assert_eq!(params.page_limitation_s, 10);
        assert_eq!(params.page_limitation_xl, 50);
        assert!(params.is_all_reply_shown);
    }

    #[test]
    fn test_limit_outside_choices_rejected() {
        let mut body = full_body();
        body["pageLimitationM"] = json!(20);
        let raw: FunctionSettingsParams = serde_json::from_value(body).unwrap();

        let Err(ApiError::Validation(fields)) = CustomizeFunctionParams::try_from(raw) else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "pageLimitationM");
    }

    #[test]
    fn test_missing_flag_rejected() {
        let mut body = full_body();
        body.as_object_mut().unwrap().remove("isAllReplyShown");
        let raw: FunctionSettingsParams = serde_json::from_value(body).unwrap();

        let Err(ApiError::Validation(fields)) = CustomizeFunctionParams::try_from(raw) else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "isAllReplyShown");
    }

    #[test]
    fn test_bad_fields_use_request_names() {
        let mut body = full_body();
        body["pageLimitationXL"] = json!("20");
        body["isSavedStatesOfTabChanges"] = json!("yes");
        let raw: FunctionSettingsParams = serde_json::from_value(body).unwrap();

        let Err(ApiError::Validation(fields)) = CustomizeFunctionParams::try_from(raw) else {
            panic!("expected validation error");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["isSavedStatesOfTabChanges", "pageLimitationXL"]);
    }
}
