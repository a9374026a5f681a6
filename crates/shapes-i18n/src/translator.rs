//! Shared translation handle for host code.
//!
//! A [`Translator`] is passed to every component that shows text; there is
//! no process-wide registry. Reloading builds a complete new [`Catalog`]
//! first and then swaps it in together with its display settings, so
//! readers never observe a half-loaded catalog and a failed reload leaves
//! the previous state untouched.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::I18nConfig;
use crate::error::CatalogError;
use crate::model::TranslationState;
use crate::parse::load_path;

/// Catalog and display policy, always replaced as one value.
#[derive(Debug, Clone)]
struct Active {
    catalog: Arc<Option<Catalog>>,
    include_unfinished: bool,
}

/// Owner of the active catalog.
#[derive(Debug)]
pub struct Translator {
    active: RwLock<Active>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::source_only()
    }
}

impl Translator {
    /// A translator that shows every string untranslated.
    #[must_use]
    pub fn source_only() -> Self {
        Self {
            active: RwLock::new(Active {
                catalog: Arc::new(None),
                include_unfinished: true,
            }),
        }
    }

    /// A translator serving `catalog`.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        let translator = Self::source_only();
        translator.install(catalog);
        translator
    }

    /// Build a translator for the configured locale.
    ///
    /// Falls back to source strings when no locale is set, the catalog file
    /// does not exist, or it fails to load.
    #[must_use]
    pub fn from_config(config: &I18nConfig) -> Self {
        let translator = Self::source_only();
        if let Err(err) = translator.reload(config) {
            warn!(
                error = %err,
                locale = config.locale.as_deref().unwrap_or_default(),
                "translation catalog rejected; using source strings"
            );
        }
        translator
    }

    /// Replace the active catalog, keeping the unfinished policy.
    pub fn install(&self, catalog: Catalog) {
        self.update(|active| active.catalog = Arc::new(Some(catalog)));
    }

    /// Drop the active catalog and show source strings.
    pub fn clear(&self) {
        self.update(|active| active.catalog = Arc::new(None));
    }

    /// Whether translations marked unfinished are shown.
    pub fn set_include_unfinished(&self, include: bool) {
        self.update(|active| active.include_unfinished = include);
    }

    fn update(&self, apply: impl FnOnce(&mut Active)) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut *active);
    }

    fn replace(&self, catalog: Option<Catalog>, include_unfinished: bool) {
        self.update(|active| {
            *active = Active {
                catalog: Arc::new(catalog),
                include_unfinished,
            };
        });
    }

    fn current(&self) -> Active {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-resolve and load the catalog for `config`.
    ///
    /// A missing locale or catalog file switches to source strings. A load
    /// error is returned and the previous catalog and policy stay in use.
    pub fn reload(&self, config: &I18nConfig) -> Result<(), CatalogError> {
        let Some(path) = config.catalog_path() else {
            info!(
                locale = config.locale.as_deref().unwrap_or_default(),
                "no translatable locale; using source strings"
            );
            self.replace(None, config.include_unfinished);
            return Ok(());
        };
        if !path.is_file() {
            info!(path = %path.display(), "no catalog for locale; using source strings");
            self.replace(None, config.include_unfinished);
            return Ok(());
        }

        let catalog = load_path(&path)?;
        info!(
            path = %path.display(),
            language = catalog.language(),
            messages = catalog.len(),
            include_unfinished = config.include_unfinished,
            "translation catalog installed"
        );
        self.replace(Some(catalog), config.include_unfinished);
        Ok(())
    }

    /// The active catalog, stable for as long as the caller holds it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Option<Catalog>> {
        self.current().catalog
    }

    /// Target language of the active catalog, if any.
    #[must_use]
    pub fn language(&self) -> Option<String> {
        self.snapshot()
            .as_ref()
            .as_ref()
            .map(|catalog| catalog.language().to_string())
    }

    /// Translate `source` within `context`.
    #[must_use]
    pub fn tr(&self, context: &str, source: &str) -> String {
        self.tr_with_comment(context, source, None)
    }

    /// Translate a key that carries a disambiguating comment.
    ///
    /// Never fails: ambiguity is logged and shows the source text.
    #[must_use]
    pub fn tr_with_comment(&self, context: &str, source: &str, comment: Option<&str>) -> String {
        let active = self.current();
        let Some(catalog) = active.catalog.as_ref() else {
            return source.to_string();
        };
        let result = if active.include_unfinished {
            catalog.lookup(context, source, comment)
        } else {
            catalog.lookup_finished(context, source, comment)
        };
        match result {
            Ok(text) => text.to_string(),
            Err(err) => {
                warn!(error = %err, context, source, "translation lookup failed; showing source");
                source.to_string()
            }
        }
    }

    /// Translate a numerus message for `count`.
    #[must_use]
    pub fn tr_numerus(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
        count: i64,
    ) -> String {
        let active = self.current();
        let Some(catalog) = active.catalog.as_ref() else {
            return source.to_string();
        };
        if !active.include_unfinished {
            let unfinished = catalog
                .find(context, source, comment)
                .ok()
                .flatten()
                .is_some_and(|m| m.state == TranslationState::Unfinished);
            if unfinished {
                return source.to_string();
            }
        }
        match catalog.lookup_numerus(context, source, comment, count) {
            Ok(text) => text.to_string(),
            Err(err) => {
                warn!(error = %err, context, source, "translation lookup failed; showing source");
                source.to_string()
            }
        }
    }
}
