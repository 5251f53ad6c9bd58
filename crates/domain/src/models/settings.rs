//! Admin-editable wiki settings.
//!
//! Settings live in a key-value config store under the `crowi` namespace.
//! Values are JSON so booleans and numbers round-trip without a schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Namespace for every key in this module.
pub const CONFIG_NAMESPACE: &str = "crowi";

/// Config keys read or written by the admin API.
pub mod keys {
    pub const IS_ENABLED_TIMELINE: &str = "customize:isEnabledTimeline";
    pub const IS_SAVED_STATES_OF_TAB_CHANGES: &str = "customize:isSavedStatesOfTabChanges";
    pub const IS_ENABLED_ATTACH_TITLE_HEADER: &str = "customize:isEnabledAttachTitleHeader";
    pub const SHOW_PAGE_LIMITATION_S: &str = "customize:showPageLimitationS";
    pub const SHOW_PAGE_LIMITATION_M: &str = "customize:showPageLimitationM";
    pub const SHOW_PAGE_LIMITATION_L: &str = "customize:showPageLimitationL";
    pub const SHOW_PAGE_LIMITATION_XL: &str = "customize:showPageLimitationXL";
    pub const IS_ENABLED_STALE_NOTIFICATION: &str = "customize:isEnabledStaleNotification";
    pub const IS_ALL_REPLY_SHOWN: &str = "customize:isAllReplyShown";
    pub const SITE_URL: &str = "app:siteUrl";
}

/// Page-list size tier. Each tier has its own configurable limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageListTier {
    /// Page contents modal.
    S,
    /// User page.
    M,
    /// Draft and search pages.
    L,
    /// Not-found and trash pages.
    XL,
}

impl PageListTier {
    pub const ALL: [PageListTier; 4] = [
        PageListTier::S,
        PageListTier::M,
        PageListTier::L,
        PageListTier::XL,
    ];

    pub fn config_key(&self) -> &'static str {
        match self {
            PageListTier::S => keys::SHOW_PAGE_LIMITATION_S,
            PageListTier::M => keys::SHOW_PAGE_LIMITATION_M,
            PageListTier::L => keys::SHOW_PAGE_LIMITATION_L,
            PageListTier::XL => keys::SHOW_PAGE_LIMITATION_XL,
        }
    }
}

/// Limits selectable in the customize screen.
pub const PAGE_LIST_LIMIT_CHOICES: [u32; 3] = [10, 30, 50];

/// The customize "function" settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizeFunctionParams {
    pub is_enabled_timeline: bool,
    pub is_saved_states_of_tab_changes: bool,
    pub is_enabled_attach_title_header: bool,
    #[serde(rename = "pageLimitationS")]
    pub page_limitation_s: u32,
    #[serde(rename = "pageLimitationM")]
    pub page_limitation_m: u32,
    #[serde(rename = "pageLimitationL")]
    pub page_limitation_l: u32,
    #[serde(rename = "pageLimitationXL")]
    pub page_limitation_xl: u32,
    pub is_enabled_stale_notification: bool,
    pub is_all_reply_shown: bool,
}

impl Default for CustomizeFunctionParams {
    fn default() -> Self {
        let limit = crate::services::page_limit::DEFAULT_PAGE_LIST_LIMIT;
        Self {
            is_enabled_timeline: true,
            is_saved_states_of_tab_changes: true,
            is_enabled_attach_title_header: false,
            page_limitation_s: limit,
            page_limitation_m: limit,
            page_limitation_l: limit,
            page_limitation_xl: limit,
            is_enabled_stale_notification: false,
            is_all_reply_shown: false,
        }
    }
}

impl CustomizeFunctionParams {
    /// Every key the params are stored under.
    pub const KEYS: [&'static str; 9] = [
        keys::IS_ENABLED_TIMELINE,
        keys::IS_SAVED_STATES_OF_TAB_CHANGES,
        keys::IS_ENABLED_ATTACH_TITLE_HEADER,
        keys::SHOW_PAGE_LIMITATION_S,
        keys::SHOW_PAGE_LIMITATION_M,
        keys::SHOW_PAGE_LIMITATION_L,
        keys::SHOW_PAGE_LIMITATION_XL,
        keys::IS_ENABLED_STALE_NOTIFICATION,
        keys::IS_ALL_REPLY_SHOWN,
    ];

    /// Builds params from stored values, falling back to defaults for
    /// missing or mistyped entries.
    pub fn from_values(values: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            values.get(key).and_then(Value::as_bool).unwrap_or(default)
        };
        let limit = |tier: PageListTier| {
            crate::services::page_limit::configured_limit(values.get(tier.config_key()))
                .unwrap_or(crate::services::page_limit::DEFAULT_PAGE_LIST_LIMIT)
        };

        Self {
            is_enabled_timeline: flag(keys::IS_ENABLED_TIMELINE, defaults.is_enabled_timeline),
            is_saved_states_of_tab_changes: flag(
                keys::IS_SAVED_STATES_OF_TAB_CHANGES,
                defaults.is_saved_states_of_tab_changes,
            ),
            is_enabled_attach_title_header: flag(
                keys::IS_ENABLED_ATTACH_TITLE_HEADER,
                defaults.is_enabled_attach_title_header,
            ),
            page_limitation_s: limit(PageListTier::S),
            page_limitation_m: limit(PageListTier::M),
            page_limitation_l: limit(PageListTier::L),
            page_limitation_xl: limit(PageListTier::XL),
            is_enabled_stale_notification: flag(
                keys::IS_ENABLED_STALE_NOTIFICATION,
                defaults.is_enabled_stale_notification,
            ),
            is_all_reply_shown: flag(keys::IS_ALL_REPLY_SHOWN, defaults.is_all_reply_shown),
        }
    }

    /// Key/value pairs to persist.
    pub fn to_config_entries(&self) -> Vec<(String, Value)> {
        vec![
            (keys::IS_ENABLED_TIMELINE.to_string(), Value::from(self.is_enabled_timeline)),
            (
                keys::IS_SAVED_STATES_OF_TAB_CHANGES.to_string(),
                Value::from(self.is_saved_states_of_tab_changes),
            ),
            (
                keys::IS_ENABLED_ATTACH_TITLE_HEADER.to_string(),
                Value::from(self.is_enabled_attach_title_header),
            ),
            (keys::SHOW_PAGE_LIMITATION_S.to_string(), Value::from(self.page_limitation_s)),
            (keys::SHOW_PAGE_LIMITATION_M.to_string(), Value::from(self.page_limitation_m)),
            (keys::SHOW_PAGE_LIMITATION_L.to_string(), Value::from(self.page_limitation_l)),
            (keys::SHOW_PAGE_LIMITATION_XL.to_string(), Value::from(self.page_limitation_xl)),
            (
                keys::IS_ENABLED_STALE_NOTIFICATION.to_string(),
                Value::from(self.is_enabled_stale_notification),
            ),
            (keys::IS_ALL_REPLY_SHOWN.to_string(), Value::from(self.is_all_reply_shown)),
        ]
    }
}

/// Site URL as stored in the config store and as given by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteUrlParams {
    pub site_url: Option<String>,
    pub env_site_url: Option<String>,
}

/// Strips trailing slashes so `https://wiki.example.com/` and
/// `https://wiki.example.com` are stored the same way.
pub fn normalize_site_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
