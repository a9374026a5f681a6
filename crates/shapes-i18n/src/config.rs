//! Locale selection and catalog file resolution.
//!
//! The plugin ships one catalog per language as
//! `{catalog_dir}/{catalog_stem}_{lang}.ts`, where `lang` is the two-letter
//! prefix of the user's locale (`nl_NL.UTF-8` → `nl`).
//!
//! # Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SHAPES_I18N_DIR` | Catalog directory (default `i18n`) |
//! | `SHAPES_I18N_STEM` | File name stem (default `geometry_shapes`) |
//! | `SHAPES_I18N_LOCALE` | Locale override |
//! | `SHAPES_I18N_NO_UNFINISHED` | Truthy: unfinished translations show the source |
//! | `LC_ALL`, `LC_MESSAGES`, `LANG` | User locale, in that order, when no override is set |

use std::path::PathBuf;

/// Default catalog directory, relative to the plugin root.
pub const DEFAULT_CATALOG_DIR: &str = "i18n";

/// Default catalog file name stem.
pub const DEFAULT_CATALOG_STEM: &str = "geometry_shapes";

#[inline]
fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Two-letter language code of a locale string.
///
/// Returns `None` for the portable `C`/`POSIX` locales and for strings that
/// do not start with two ASCII letters.
#[must_use]
pub fn language_code(locale: &str) -> Option<String> {
    let locale = locale.trim();
    if locale.eq_ignore_ascii_case("c")
        || locale.eq_ignore_ascii_case("posix")
        || locale.starts_with("C.")
    {
        return None;
    }
    let code = locale.get(..2)?;
    code.chars()
        .all(|c| c.is_ascii_alphabetic())
        .then(|| code.to_ascii_lowercase())
}

/// Where catalogs live and which one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18nConfig {
    pub catalog_dir: PathBuf,
    pub catalog_stem: String,
    /// User locale (`nl_NL.UTF-8`, `nl`, ...). `None` means source strings.
    pub locale: Option<String>,
    /// Whether translations marked unfinished are shown.
    pub include_unfinished: bool,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from(DEFAULT_CATALOG_DIR),
            catalog_stem: DEFAULT_CATALOG_STEM.to_string(),
            locale: None,
            include_unfinished: true,
        }
    }
}

impl I18nConfig {
    /// Defaults with an explicit locale.
    #[must_use]
    pub fn for_locale(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..Self::default()
        }
    }

    /// Set the catalog directory.
    #[must_use]
    pub fn with_catalog_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.catalog_dir = dir.into();
        self
    }

    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read configuration through a custom environment lookup.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = non_empty(get_env("SHAPES_I18N_DIR")) {
            config.catalog_dir = PathBuf::from(dir);
        }
        if let Some(stem) = non_empty(get_env("SHAPES_I18N_STEM")) {
            config.catalog_stem = stem;
        }
        if let Some(value) = get_env("SHAPES_I18N_NO_UNFINISHED") {
            config.include_unfinished = !env_flag(&value);
        }
        config.locale = non_empty(get_env("SHAPES_I18N_LOCALE"))
            .or_else(|| non_empty(get_env("LC_ALL")))
            .or_else(|| non_empty(get_env("LC_MESSAGES")))
            .or_else(|| non_empty(get_env("LANG")));
        config
    }

    /// Language code for the configured locale.
    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.locale.as_deref().and_then(language_code)
    }

    /// Catalog file for the configured locale, whether or not it exists.
    #[must_use]
    pub fn catalog_path(&self) -> Option<PathBuf> {
        let lang = self.language()?;
        Some(
            self.catalog_dir
                .join(format!("{}_{lang}.ts", self.catalog_stem)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn language_codes() {
        assert_eq!(language_code("nl_NL.UTF-8").as_deref(), Some("nl"));
        assert_eq!(language_code("NL").as_deref(), Some("nl"));
        assert_eq!(language_code("de-AT").as_deref(), Some("de"));
        assert_eq!(language_code("C"), None);
        assert_eq!(language_code("C.UTF-8"), None);
        assert_eq!(language_code("POSIX"), None);
        assert_eq!(language_code("n"), None);
        assert_eq!(language_code("1x"), None);
        assert_eq!(language_code(""), None);
    }

    #[test]
    fn defaults() {
        let config = I18nConfig::default();
        assert_eq!(config.catalog_dir, PathBuf::from("i18n"));
        assert_eq!(config.catalog_stem, "geometry_shapes");
        assert!(config.include_unfinished);
        assert_eq!(config.catalog_path(), None);
    }

    #[test]
    fn catalog_path_from_locale() {
        let config = I18nConfig::for_locale("nl_NL.UTF-8").with_catalog_dir("/plugins/shapes/i18n");
        assert_eq!(
            config.catalog_path(),
            Some(PathBuf::from("/plugins/shapes/i18n/geometry_shapes_nl.ts"))
        );
    }

    #[test]
    fn env_override_wins() {
        let config = I18nConfig::from_env_with(env(&[
            ("SHAPES_I18N_LOCALE", "fr_FR"),
            ("LC_ALL", "nl_NL.UTF-8"),
            ("SHAPES_I18N_DIR", "/opt/i18n"),
            ("SHAPES_I18N_STEM", "shapes"),
            ("SHAPES_I18N_NO_UNFINISHED", "yes"),
        ]));
        assert_eq!(config.locale.as_deref(), Some("fr_FR"));
        assert_eq!(
            config.catalog_path(),
            Some(PathBuf::from("/opt/i18n/shapes_fr.ts"))
        );
        assert!(!config.include_unfinished);
    }

    #[test]
    fn posix_locale_precedence() {
        let config = I18nConfig::from_env_with(env(&[
            ("LC_ALL", ""),
            ("LC_MESSAGES", "nl_BE.UTF-8"),
            ("LANG", "en_US.UTF-8"),
        ]));
        assert_eq!(config.language().as_deref(), Some("nl"));

        let config = I18nConfig::from_env_with(env(&[("LANG", "de_DE")]));
        assert_eq!(config.language().as_deref(), Some("de"));
    }

    #[test]
    fn empty_environment() {
        let config = I18nConfig::from_env_with(|_| None);
        assert_eq!(config, I18nConfig::default());
    }

    #[test]
    fn falsy_flag_keeps_unfinished() {
        let config = I18nConfig::from_env_with(env(&[("SHAPES_I18N_NO_UNFINISHED", "0")]));
        assert!(config.include_unfinished);
    }
}
