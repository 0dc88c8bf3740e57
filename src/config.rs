//! Site-wide configuration.
//!
//! Values are baked in at compile time (`FOLIO_*` environment variables seen
//! by `cargo`), and native builds may override them at runtime with the same
//! variable names.

const DEFAULT_FIRESTORE_PROJECT: &str = "portfolio--visitor-tracker";
const DEFAULT_SITE_TITLE: &str = "Sujeet Kumar - Portfolio";
const DEFAULT_RECENT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub site_title: String,
    pub firestore_project: String,
    /// Web API key sent with Firestore REST calls; tracking is disabled without it.
    pub firestore_api_key: Option<String>,
    pub dashboard_pin: Option<String>,
    pub dashboard_limit: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: DEFAULT_SITE_TITLE.to_string(),
            firestore_project: DEFAULT_FIRESTORE_PROJECT.to_string(),
            firestore_api_key: None,
            dashboard_pin: None,
            dashboard_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl SiteConfig {
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply(|name| match name {
            "FOLIO_SITE_TITLE" => option_env!("FOLIO_SITE_TITLE").map(str::to_string),
            "FOLIO_FIRESTORE_PROJECT" => {
                option_env!("FOLIO_FIRESTORE_PROJECT").map(str::to_string)
            }
            "FOLIO_FIRESTORE_API_KEY" => {
                option_env!("FOLIO_FIRESTORE_API_KEY").map(str::to_string)
            }
            "FOLIO_DASHBOARD_PIN" => option_env!("FOLIO_DASHBOARD_PIN").map(str::to_string),
            "FOLIO_DASHBOARD_LIMIT" => option_env!("FOLIO_DASHBOARD_LIMIT").map(str::to_string),
            _ => None,
        });
        #[cfg(not(target_arch = "wasm32"))]
        config.apply(|name| std::env::var(name).ok());
        config
    }

    /// Overlay every variable `lookup` knows about.
    pub fn apply<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(title) = non_empty("FOLIO_SITE_TITLE") {
            self.site_title = title;
        }
        if let Some(project) = non_empty("FOLIO_FIRESTORE_PROJECT") {
            self.firestore_project = project;
        }
        if let Some(key) = non_empty("FOLIO_FIRESTORE_API_KEY") {
            self.firestore_api_key = Some(key);
        }
        if let Some(pin) = non_empty("FOLIO_DASHBOARD_PIN") {
            self.dashboard_pin = Some(pin);
        }
        if let Some(limit) = non_empty("FOLIO_DASHBOARD_LIMIT") {
            match limit.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => self.dashboard_limit = limit,
                _ => tracing::warn!(%limit, "ignoring invalid FOLIO_DASHBOARD_LIMIT"),
            }
        }
    }

    pub fn tracking_enabled(&self) -> bool {
        self.firestore_api_key.is_some()
    }

    /// No configured PIN means the dashboard stays locked.
    pub fn dashboard_pin_matches(&self, candidate: &str) -> bool {
        let Some(pin) = self.dashboard_pin.as_deref() else {
            return false;
        };
        let candidate = candidate.trim();
        pin.len() == candidate.len()
            && pin
                .bytes()
                .zip(candidate.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_replace_defaults() {
        let vars: HashMap<&str, &str> = [
            ("FOLIO_FIRESTORE_API_KEY", "key-123"),
            ("FOLIO_DASHBOARD_PIN", "2025"),
            ("FOLIO_DASHBOARD_LIMIT", "20"),
            ("FOLIO_SITE_TITLE", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.apply(|name| vars.get(name).map(|value| value.to_string()));

        assert!(config.tracking_enabled());
        assert_eq!(config.dashboard_limit, 20);
        assert_eq!(config.site_title, DEFAULT_SITE_TITLE);
        assert_eq!(config.firestore_project, DEFAULT_FIRESTORE_PROJECT);
    }

    #[test]
    fn invalid_limit_is_ignored() {
        let mut config = SiteConfig::default();
        config.apply(|name| (name == "FOLIO_DASHBOARD_LIMIT").then(|| "zero".to_string()));
        assert_eq!(config.dashboard_limit, DEFAULT_RECENT_LIMIT);
    }

    #[test]
    fn dashboard_requires_a_configured_pin() {
        let mut config = SiteConfig::default();
        assert!(!config.dashboard_pin_matches(""));

        config.dashboard_pin = Some("2025".to_string());
        assert!(config.dashboard_pin_matches("2025"));
        assert!(config.dashboard_pin_matches(" 2025 "));
        assert!(!config.dashboard_pin_matches("2024"));
        assert!(!config.dashboard_pin_matches("20255"));
    }
}
