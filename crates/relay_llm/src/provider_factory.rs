//! Provider factory
//!
//! Creates the upstream provider from configuration. The provider is
//! built once at startup and injected into request handlers; nothing in
//! the request path constructs clients.

use std::sync::Arc;

use relay_core::{RelayConfig, UpstreamMode};

use crate::provider::{GenerationProvider, UpstreamError};
use crate::providers::{DirectProvider, FlowProvider};

pub fn provider_from_config(
    config: &RelayConfig,
) -> Result<Arc<dyn GenerationProvider>, UpstreamError> {
    match config.upstream_mode {
        UpstreamMode::Direct => {
            let api_key = config
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    UpstreamError::Auth("upstream API key is required in direct mode".to_string())
                })?;

            let mut provider =
                DirectProvider::new(api_key).with_timeout(config.upstream_timeout());

            if let Some(base_url) = config.api_base.as_deref().filter(|u| !u.is_empty()) {
                provider = provider.with_base_url(base_url);
            }
            if let Some(model) = config.model.as_deref().filter(|m| !m.is_empty()) {
                provider = provider.with_model(model);
            }

            Ok(Arc::new(provider))
        }

        UpstreamMode::Flow => {
            let base_url = config
                .api_base
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    UpstreamError::Auth("upstream API base is required in flow mode".to_string())
                })?;
            let flow_id = config
                .flow_id
                .as_deref()
                .filter(|f| !f.is_empty())
                .ok_or_else(|| {
                    UpstreamError::Auth("flow id is required in flow mode".to_string())
                })?;

            Ok(Arc::new(
                FlowProvider::new(base_url, flow_id).with_timeout(config.upstream_timeout()),
            ))
        }
    }
}
