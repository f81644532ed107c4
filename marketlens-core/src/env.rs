//! Environment overrides for per-source configuration.
//!
//! Variables are named `MARKETLENS_<TAG>_<FIELD>` where `<TAG>` is the
//! upper-cased source tag (`CENSUS`, `COUNTY_ASSESSOR`, ...). Only
//! `API_KEY`, `BASE_URL` and `ENABLED` are read. Unset or empty values leave
//! the config untouched.

use crate::model::{DataSource, DataSourceConfig};

pub const ENV_PREFIX: &str = "MARKETLENS";

/// `MARKETLENS_<TAG>_<field>`.
pub fn var_name(source: DataSource, field: &str) -> String {
    format!("{ENV_PREFIX}_{}_{field}", source.env_tag())
}

/// `0`, `false`, `no`, `off` (any case) disable; anything else enables.
pub fn parse_enabled(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

impl DataSourceConfig {
    /// Layer the process environment over this config.
    pub fn apply_env(self, source: DataSource) -> Self {
        self.apply_env_with(source, |name| std::env::var(name).ok())
    }

    /// Layer variables from `lookup` over this config.
    pub fn apply_env_with(
        mut self,
        source: DataSource,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let get = |field: &str| lookup(&var_name(source, field)).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = get("BASE_URL") {
            self.base_url = url;
        }
        if let Some(flag) = get("ENABLED") {
            self.enabled = parse_enabled(&flag);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn var_names_use_upper_case_tags() {
        assert_eq!(var_name(DataSource::Census, "API_KEY"), "MARKETLENS_CENSUS_API_KEY");
        assert_eq!(
            var_name(DataSource::CountyAssessor, "ENABLED"),
            "MARKETLENS_COUNTY_ASSESSOR_ENABLED"
        );
    }

    #[test]
    fn overrides_key_url_and_enabled() {
        let config = DataSourceConfig::defaults_for(DataSource::Census).apply_env_with(
            DataSource::Census,
            lookup(&[
                ("MARKETLENS_CENSUS_API_KEY", "abc"),
                ("MARKETLENS_CENSUS_BASE_URL", "http://localhost:9000"),
                ("MARKETLENS_CENSUS_ENABLED", "off"),
            ]),
        );
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.base_url, "http://localhost:9000");
        assert!(!config.enabled);
    }

    #[test]
    fn empty_and_foreign_values_are_ignored() {
        let defaults = DataSourceConfig::defaults_for(DataSource::Zillow);
        let config = defaults.clone().apply_env_with(
            DataSource::Zillow,
            lookup(&[
                ("MARKETLENS_ZILLOW_API_KEY", ""),
                ("MARKETLENS_ZILLOW_ENABLED", "  "),
                ("MARKETLENS_CENSUS_API_KEY", "not-mine"),
            ]),
        );
        assert_eq!(config, defaults);
    }

    #[test]
    fn enabled_flag_parsing() {
        for off in ["0", "false", "FALSE", "no", "Off"] {
            assert!(!parse_enabled(off), "{off}");
        }
        for on in ["1", "true", "yes", "on", "anything"] {
            assert!(parse_enabled(on), "{on}");
        }
    }
}
