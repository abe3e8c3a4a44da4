//! Engine configuration
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use crate::accessor::ResolverConfig;
use serde::{Deserialize, Serialize};

/// Configuration for building the engine's default collaborators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: EngineConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.resolver.max_depth, 32);

        let config: EngineConfig = serde_json::from_value(json!({"resolver": {"max_depth": 4}})).unwrap();
        assert_eq!(config.resolver.max_depth, 4);
    }
}
