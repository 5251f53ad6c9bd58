//! Reading and writing admin settings through a [`ConfigLookup`].

use serde_json::Value;
use std::collections::HashMap;

use super::directory::{ConfigLookup, DirectoryError};
use crate::models::{keys, normalize_site_url, CustomizeFunctionParams};

/// Loads the customize function settings, filling in defaults.
pub async fn load_customize_params(
    config: &dyn ConfigLookup,
) -> Result<CustomizeFunctionParams, DirectoryError> {
    let mut values = HashMap::new();
    for key in CustomizeFunctionParams::KEYS {
        if let Some(value) = config.get_config(key).await? {
            values.insert(key.to_string(), value);
        }
    }
    Ok(CustomizeFunctionParams::from_values(&values))
}

/// Stores every customize function setting.
pub async fn save_customize_params(
    config: &dyn ConfigLookup,
    params: &CustomizeFunctionParams,
) -> Result<(), DirectoryError> {
    config.update_configs(params.to_config_entries()).await
}

/// The stored site URL, if one is set.
pub async fn load_site_url(config: &dyn ConfigLookup) -> Result<Option<String>, DirectoryError> {
    let value = config.get_config(keys::SITE_URL).await?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string))
}

/// Stores the site URL. An empty URL clears the setting.
///
/// Returns the value as stored.
pub async fn save_site_url(
    config: &dyn ConfigLookup,
    url: &str,
) -> Result<Option<String>, DirectoryError> {
    let normalized = normalize_site_url(url);
    let value = if normalized.is_empty() {
        Value::Null
    } else {
        Value::String(normalized.clone())
    };

    config
        .update_configs(vec![(keys::SITE_URL.to_string(), value)])
        .await?;

    Ok((!normalized.is_empty()).then_some(normalized))
}
