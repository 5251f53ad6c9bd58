//! Page-list limit resolution.
//!
//! A page list uses, in order: the limit given in the request, the limit
//! configured for its tier, then [`DEFAULT_PAGE_LIST_LIMIT`].

use serde_json::Value;

use super::directory::{ConfigLookup, DirectoryError};
use crate::models::PageListTier;

/// Limit used when neither the request nor the config store sets one.
pub const DEFAULT_PAGE_LIST_LIMIT: u32 = 30;

/// Largest limit a client may request for a user's recent pages.
pub const MAX_RECENT_PAGES_LIMIT: u32 = 300;

/// Interprets a stored limit. Null, zero, negative or non-integer values
/// count as unset.
pub fn configured_limit(value: Option<&Value>) -> Option<u32> {
    let value = value?;
    if value.is_null() {
        return None;
    }

    match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
        Some(limit) if limit > 0 => Some(limit),
        _ => {
            tracing::warn!(value = %value, "Ignoring malformed page list limit");
            None
        }
    }
}

/// Picks the effective limit from a requested and a configured value.
pub fn resolve_page_limit(requested: Option<u32>, configured: Option<&Value>) -> u32 {
    requested
        .or_else(|| configured_limit(configured))
        .unwrap_or(DEFAULT_PAGE_LIST_LIMIT)
}

/// Resolves the limit for `tier`, reading the config store only when the
/// request did not give one.
pub async fn resolve_page_list_limit(
    requested: Option<u32>,
    tier: PageListTier,
    config: &dyn ConfigLookup,
) -> Result<u32, DirectoryError> {
    if let Some(limit) = requested {
        return Ok(limit);
    }

    let configured = config.get_config(tier.config_key()).await?;
    Ok(resolve_page_limit(None, configured.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StaticConfig {
        values: HashMap<String, Value>,
        reads: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ConfigLookup for StaticConfig {
        async fn get_config(&self, key: &str) -> Result<Option<Value>, DirectoryError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DirectoryError::Other("config store offline".to_string()));
            }
            Ok(self.values.get(key).cloned())
        }

        async fn update_configs(&self, _: Vec<(String, Value)>) -> Result<(), DirectoryError> {
            Ok(())
        }
    }

    #[test]
    fn test_requested_limit_wins() {
        assert_eq!(resolve_page_limit(Some(10), Some(&json!(20))), 10);
    }

    #[test]
    fn test_configured_limit_used_when_not_requested() {
        assert_eq!(resolve_page_limit(None, Some(&json!(20))), 20);
    }

    #[test]
    fn test_default_when_unset() {
        assert_eq!(resolve_page_limit(None, None), DEFAULT_PAGE_LIST_LIMIT);
        assert_eq!(resolve_page_limit(None, Some(&Value::Null)), 30);
    }

    #[test]
    fn test_malformed_config_counts_as_unset() {
        assert_eq!(configured_limit(Some(&json!(0))), None);
        assert_eq!(configured_limit(Some(&json!(-5))), None);
        assert_eq!(configured_limit(Some(&json!(12.5))), None);
        assert_eq!(configured_limit(Some(&json!("20"))), None);
        assert_eq!(configured_limit(Some(&json!(true))), None);
        assert_eq!(resolve_page_limit(None, Some(&json!("abc"))), 30);
    }

    #[tokio::test]
    async fn test_tier_lookup_reads_tier_key() {
        let mut config = StaticConfig::default();
        config
            .values
            .insert("customize:showPageLimitationM".to_string(), json!(20));
        config
            .values
            .insert("customize:showPageLimitationS".to_string(), json!(10));

        let limit = resolve_page_list_limit(None, PageListTier::M, &config)
            .await
            .unwrap();
        assert_eq!(limit, 20);
    }

    #[tokio::test]
    async fn test_requested_limit_skips_config_read() {
        let config = StaticConfig {
            fail: true,
            ..Default::default()
        };

        let limit = resolve_page_list_limit(Some(5), PageListTier::M, &config)
            .await
            .unwrap();
        assert_eq!(limit, 5);
        assert_eq!(config.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unset_tier_uses_default() {
        let config = StaticConfig::default();
        let limit = resolve_page_list_limit(None, PageListTier::XL, &config)
            .await
            .unwrap();
        assert_eq!(limit, DEFAULT_PAGE_LIST_LIMIT);
        assert_eq!(config.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_config_failure_propagates() {
        let config = StaticConfig {
            fail: true,
            ..Default::default()
        };
        assert!(resolve_page_list_limit(None, PageListTier::M, &config)
            .await
            .is_err());
    }
}
