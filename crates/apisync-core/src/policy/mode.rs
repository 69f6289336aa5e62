//! Policy generation modes.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// One kind of Kuadrant resource derived from an OpenAPI document.
///
/// The string form doubles as the suffix of the generated file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[derive(Serialize, Deserialize)]
pub enum GenerationMode {
    /// Gateway API `HTTPRoute`.
    #[strum(serialize = "httproute")]
    #[serde(rename = "httproute")]
    HttpRoute,
    /// Kuadrant `AuthPolicy`.
    #[strum(serialize = "authpolicy")]
    #[serde(rename = "authpolicy")]
    AuthPolicy,
    /// Kuadrant `RateLimitPolicy`.
    #[strum(serialize = "ratelimiting_policy")]
    #[serde(rename = "ratelimiting_policy")]
    RateLimitPolicy,
}

impl GenerationMode {
    /// Every mode, in the order they are generated.
    pub const ALL: [GenerationMode; 3] = [Self::HttpRoute, Self::AuthPolicy, Self::RateLimitPolicy];
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_mode_suffixes() {
        assert_eq!(GenerationMode::HttpRoute.as_ref(), "httproute");
        assert_eq!(GenerationMode::AuthPolicy.as_ref(), "authpolicy");
        assert_eq!(GenerationMode::RateLimitPolicy.as_ref(), "ratelimiting_policy");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            GenerationMode::from_str("ratelimiting_policy").unwrap(),
            GenerationMode::RateLimitPolicy
        );
        assert!(GenerationMode::from_str("ratelimitpolicy").is_err());
    }

    #[test]
    fn test_all_matches_iter() {
        let iterated: Vec<_> = GenerationMode::iter().collect();
        assert_eq!(iterated, GenerationMode::ALL.to_vec());
    }
}
