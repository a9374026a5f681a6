//! Immutable translation catalog with keyed lookup.
//!
//! # Invariants
//!
//! 1. **Unique keys**: within a context, no two active messages share
//!    (source, comment). [`CatalogBuilder::build`] rejects collisions.
//!
//! 2. **Lookup never fails on absence**: an unknown context or source, or
//!    an empty translation, yields the caller's source string.
//!
//! 3. **Thread safety**: `Catalog` is `Send + Sync` (all data is immutable
//!    after construction).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Missing context | Context not in catalog | Returns source |
//! | Missing message | Source not in context | Returns source |
//! | Empty translation | Not yet translated | Returns source |
//! | Obsolete message | `type="obsolete"`/`"vanished"` | Invisible, returns source |
//! | Ambiguous key | No comment given, several candidates | `AmbiguousLookup` |

use std::collections::HashMap;

use serde::Serialize;
use smallvec::SmallVec;

use crate::error::CatalogError;
use crate::model::{Context, Message, Resolution, TranslationState};
use crate::numerus::NumerusRule;

/// Active message positions for one source string within a context.
type Candidates = SmallVec<[usize; 1]>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ContextIndex {
    position: usize,
    by_source: HashMap<String, Candidates>,
}

/// All messages for one target locale.
///
/// # Example
///
/// ```
/// use shapes_i18n::{CatalogBuilder, Context, Message};
///
/// let mut tool = Context::new("GeometryTool");
/// tool.messages.push(Message::new("Set size", "Afmetingen instellen").with_comment("GeometryTool"));
/// let mut dialog = Context::new("GeometryShapesDialogBase");
/// dialog.messages.push(Message::new("Set size", "Afmetingen"));
///
/// let mut builder = CatalogBuilder::new("nl");
/// builder.push_context(tool);
/// builder.push_context(dialog);
/// let catalog = builder.build().unwrap();
///
/// assert_eq!(
///     catalog.lookup("GeometryTool", "Set size", Some("GeometryTool")).unwrap(),
///     "Afmetingen instellen"
/// );
/// assert_eq!(
///     catalog.lookup("GeometryShapesDialogBase", "Set size", None).unwrap(),
///     "Afmetingen"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    version: Option<String>,
    language: String,
    source_language: Option<String>,
    contexts: Vec<Context>,
    #[serde(skip)]
    rule: NumerusRule,
    #[serde(skip)]
    index: HashMap<String, ContextIndex>,
}

impl Catalog {
    /// Target language tag (`language` attribute), e.g. `"nl"`.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Source language tag (`sourcelanguage` attribute), if declared.
    #[must_use]
    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    /// Document format version (`version` attribute), if declared.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Plural rule derived from the target language.
    #[must_use]
    pub fn numerus_rule(&self) -> NumerusRule {
        self.rule
    }

    /// Contexts in document order.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// Context names in document order.
    pub fn context_names(&self) -> impl Iterator<Item = &str> {
        self.contexts.iter().map(|c| c.name.as_str())
    }

    /// Find a context by name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.index.get(name).map(|ix| &self.contexts[ix.position])
    }

    /// Number of messages, obsolete ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.iter().map(|c| c.messages.len()).sum()
    }

    /// Whether the catalog holds no messages at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the active message for a key.
    ///
    /// With a comment, both source and comment must match exactly. Without
    /// one, the single active message carrying that source matches; several
    /// candidates make the call ambiguous. An empty comment is the same as
    /// none.
    pub fn find(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
    ) -> Result<Option<&Message>, CatalogError> {
        let Some(ix) = self.index.get(context) else {
            return Ok(None);
        };
        let Some(candidates) = ix.by_source.get(source) else {
            return Ok(None);
        };
        let messages = &self.contexts[ix.position].messages;

        match comment.filter(|c| !c.is_empty()) {
            Some(comment) => Ok(candidates
                .iter()
                .map(|&i| &messages[i])
                .find(|m| m.comment.as_deref() == Some(comment))),
            None => match candidates.as_slice() {
                [] => Ok(None),
                [only] => Ok(Some(&messages[*only])),
                _ => Err(CatalogError::AmbiguousLookup {
                    context: context.to_string(),
                    source: source.to_string(),
                }),
            },
        }
    }

    /// Resolve a key without applying the fallback policy.
    ///
    /// Distinguishes an empty translation from an absent message.
    pub fn resolve(
        &self,
        context: &str,
        source: &str,
        comment: Option<&str>,
    ) -> Result<Resolution<'_>, CatalogError> {
        Ok(match self.find(context, source, comment)? {
            Some(message) if message.is_untranslated() => Resolution::Untranslated,
            Some(message) => Resolution::Translated(message.text()),
            None => Resolution::Missing,
        })
    }

    /// Look up the text to display for a key.
    ///
    /// Returns `source` unchanged when nothing matches or the translation is
    /// empty. The only error is [`CatalogError::AmbiguousLookup`].
    pub fn lookup<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: Option<&str>,
    ) -> Result<&'a str, CatalogError> {
        Ok(self.resolve(context, source, comment)?.or_source(source))
    }

    /// Like [`lookup`](Self::lookup), but unfinished translations fall back
    /// to the source text too.
    pub fn lookup_finished<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: Option<&str>,
    ) -> Result<&'a str, CatalogError> {
        match self.find(context, source, comment)? {
            Some(message) if message.state == TranslationState::Unfinished => Ok(source),
            Some(message) if !message.is_untranslated() => Ok(message.text()),
            _ => Ok(source),
        }
    }

    /// Look up the plural form for `count`.
    ///
    /// Picks the form index with the catalog's [`NumerusRule`]. A missing
    /// or empty form falls back to `source`.
    pub fn lookup_numerus<'a>(
        &'a self,
        context: &str,
        source: &'a str,
        comment: Option<&str>,
        count: i64,
    ) -> Result<&'a str, CatalogError> {
        let Some(message) = self.find(context, source, comment)? else {
            return Ok(source);
        };
        let text = message.numerus_text(self.rule.form_index(count));
        Ok(if text.is_empty() { source } else { text })
    }
}

/// Incremental construction of a [`Catalog`].
///
/// The document loader feeds parsed contexts through this builder, so
/// programmatic catalogs are validated exactly like loaded ones.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    version: Option<String>,
    language: String,
    source_language: Option<String>,
    contexts: Vec<Context>,
}

impl CatalogBuilder {
    /// Start a catalog for the given target language.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    /// Declare the source language.
    pub fn set_source_language(&mut self, tag: impl Into<String>) -> &mut Self {
        self.source_language = Some(tag.into());
        self
    }

    /// Declare the document format version.
    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    /// Append a whole context. Duplicate names are reported by `build`.
    pub fn push_context(&mut self, context: Context) -> &mut Self {
        self.contexts.push(context);
        self
    }

    /// Append a message to the named context, creating it at the end if it
    /// does not exist yet.
    pub fn insert(&mut self, context: &str, message: Message) -> &mut Self {
        match self.contexts.iter_mut().find(|c| c.name == context) {
            Some(existing) => existing.messages.push(message),
            None => {
                let mut created = Context::new(context);
                created.messages.push(message);
                self.contexts.push(created);
            }
        }
        self
    }

    /// Validate keys and build the lookup index.
    ///
    /// An empty comment does not disambiguate and is stored as no comment.
    pub fn build(mut self) -> Result<Catalog, CatalogError> {
        for message in self.contexts.iter_mut().flat_map(|c| c.messages.iter_mut()) {
            if message.comment.as_deref() == Some("") {
                message.comment = None;
            }
        }
        let mut index: HashMap<String, ContextIndex> = HashMap::with_capacity(self.contexts.len());

        for (position, context) in self.contexts.iter().enumerate() {
            if index.contains_key(&context.name) {
                return Err(CatalogError::DuplicateContext(context.name.clone()));
            }
            let mut ix = ContextIndex {
                position,
                by_source: HashMap::with_capacity(context.messages.len()),
            };
            for (i, message) in context.messages.iter().enumerate() {
                if !message.state.is_active() {
                    continue;
                }
                let candidates = ix.by_source.entry(message.source.clone()).or_default();
                if candidates
                    .iter()
                    .any(|&j| context.messages[j].comment == message.comment)
                {
                    return Err(CatalogError::DuplicateMessage {
                        context: context.name.clone(),
                        source: message.source.clone(),
                        comment: message.comment.clone(),
                    });
                }
                candidates.push(i);
            }
            index.insert(context.name.clone(), ix);
        }

        Ok(Catalog {
            rule: NumerusRule::for_language(&self.language),
            version: self.version,
            language: self.language,
            source_language: self.source_language,
            contexts: self.contexts,
            index,
        })
    }
}
