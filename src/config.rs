// Copyright 2024 XMapper Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Mapper configuration options

use serde::{Deserialize, Serialize};

use crate::error::MappingResult;

/// Medium date-only format, e.g. `Jan 5, 2024`
pub const MEDIUM_DATE_FORMAT: &str = "%b %-d, %Y";

/// Configuration for value decoding and loading behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Trim surrounding whitespace from element text before decoding
    pub trim_text: bool,

    /// Decode unparsable dates as the empty value instead of failing
    pub lenient_dates: bool,

    /// `chrono` format used to decode and encode dates
    pub date_format: String,

    /// Postpone class-valued bindings until `flush_deferred`
    pub defer_class_loading: bool,
}

impl MapperConfig {
    /// Configuration that fails on unparsable dates
    pub fn strict() -> Self {
        Self {
            lenient_dates: false,
            ..Self::default()
        }
    }

    /// Configuration with class-valued bindings deferred
    pub fn deferred() -> Self {
        Self {
            defer_class_loading: true,
            ..Self::default()
        }
    }

    /// Read a configuration from JSON; missing keys keep their defaults
    pub fn from_json(text: &str) -> MappingResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            trim_text: true,
            lenient_dates: true,
            date_format: MEDIUM_DATE_FORMAT.to_string(),
            defer_class_loading: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_config_default() {
        let config = MapperConfig::default();
        assert!(config.trim_text);
        assert!(config.lenient_dates);
        assert_eq!(config.date_format, "%b %-d, %Y");
        assert!(!config.defer_class_loading);
    }

    #[test]
    fn test_presets() {
        assert!(!MapperConfig::strict().lenient_dates);
        assert!(MapperConfig::deferred().defer_class_loading);
    }

    #[test]
    fn test_from_json_partial() {
        let config = MapperConfig::from_json(r#"{"lenient_dates": false, "date_format": "%Y-%m-%d"}"#)
            .unwrap();
        assert!(!config.lenient_dates);
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert!(config.trim_text);

        assert!(MapperConfig::from_json("{").is_err());
    }
}
