//! Contexts, messages, and their provenance annotations.

use serde::Serialize;

/// Where a source string was found when the catalog was extracted.
///
/// Purely descriptive. Lookup never reads it, and stale or repeated line
/// numbers are kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// `filename` attribute; absent in relative-location documents when
    /// the file is unchanged from the previous location.
    pub filename: Option<String>,
    /// `line` attribute as written (`"264"`, or `"+3"` in relative mode).
    pub line: Option<String>,
}

impl Location {
    /// Absolute location helper.
    #[must_use]
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: Some(filename.into()),
            line: Some(line.to_string()),
        }
    }

    /// Line number, if it is an absolute decimal number.
    #[must_use]
    pub fn line_number(&self) -> Option<u32> {
        self.line
            .as_deref()
            .filter(|l| !l.starts_with('+') && !l.starts_with('-'))
            .and_then(|l| l.parse().ok())
    }
}

/// Progress marker from the `type` attribute of `<translation>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationState {
    /// No `type` attribute: the translator marked the entry done.
    #[default]
    Finished,
    /// `type="unfinished"`.
    Unfinished,
    /// `type="obsolete"`: the source string no longer exists in the code.
    Obsolete,
    /// `type="vanished"`: like obsolete, written by newer extractors.
    Vanished,
}

impl TranslationState {
    /// Parse the attribute value. `None` for unknown values.
    #[must_use]
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "unfinished" => Some(Self::Unfinished),
            "obsolete" => Some(Self::Obsolete),
            "vanished" => Some(Self::Vanished),
            _ => None,
        }
    }

    /// Attribute value to write back, `None` for [`Finished`](Self::Finished).
    #[must_use]
    pub fn as_attr(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Obsolete => Some("obsolete"),
            Self::Vanished => Some("vanished"),
        }
    }

    /// Whether lookups can see a message in this state.
    #[inline]
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Finished | Self::Unfinished)
    }
}

/// One translatable unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Message {
    /// Untranslated text; part of the lookup key.
    pub source: String,
    /// Disambiguating comment; part of the lookup key when present.
    pub comment: Option<String>,
    /// Translated text. Empty means "not yet translated". Unused for
    /// numerus messages.
    pub translation: String,
    /// `numerus="yes"`: the translation is split into plural forms.
    pub numerus: bool,
    /// Plural forms in rule order (see [`crate::numerus`]).
    pub numerus_forms: Vec<String>,
    pub state: TranslationState,
    pub locations: Vec<Location>,
    pub old_source: Option<String>,
    pub old_comment: Option<String>,
    pub extra_comment: Option<String>,
    pub translator_comment: Option<String>,
}

impl Message {
    /// A finished, non-numerus message.
    #[must_use]
    pub fn new(source: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translation: translation.into(),
            ..Self::default()
        }
    }

    /// Set the disambiguating comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the translation state.
    #[must_use]
    pub fn with_state(mut self, state: TranslationState) -> Self {
        self.state = state;
        self
    }

    /// Append a location annotation.
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Turn this into a numerus message with the given forms.
    #[must_use]
    pub fn with_numerus_forms<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numerus = true;
        self.translation.clear();
        self.numerus_forms = forms.into_iter().map(Into::into).collect();
        self
    }

    /// Whether no translated text exists yet.
    #[must_use]
    pub fn is_untranslated(&self) -> bool {
        if self.numerus {
            self.numerus_forms.iter().all(String::is_empty)
        } else {
            self.translation.is_empty()
        }
    }

    /// The text shown for this message when no count is involved.
    ///
    /// Numerus messages answer with their first form.
    #[must_use]
    pub fn text(&self) -> &str {
        if self.numerus {
            self.numerus_forms.first().map_or("", String::as_str)
        } else {
            &self.translation
        }
    }

    /// The numerus form at `index`, clamped to the last available form.
    #[must_use]
    pub fn numerus_text(&self, index: usize) -> &str {
        if !self.numerus {
            return &self.translation;
        }
        let last = self.numerus_forms.len().saturating_sub(1);
        self.numerus_forms
            .get(index.min(last))
            .map_or("", String::as_str)
    }
}

/// A named group of messages, typically one dialog or tool class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Context {
    pub name: String,
    pub messages: Vec<Message>,
}

impl Context {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
        }
    }
}

/// Outcome of a lookup before the fallback policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A message matched and has translated text.
    Translated(&'a str),
    /// A message matched but its translation is empty.
    Untranslated,
    /// No active message matched.
    Missing,
}

impl<'a> Resolution<'a> {
    /// Apply the display policy: anything but a translation shows `source`.
    #[inline]
    #[must_use]
    pub fn or_source(self, source: &'a str) -> &'a str {
        match self {
            Self::Translated(text) => text,
            Self::Untranslated | Self::Missing => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_attr_round_trip() {
        for state in [
            TranslationState::Unfinished,
            TranslationState::Obsolete,
            TranslationState::Vanished,
        ] {
            let attr = state.as_attr().unwrap();
            assert_eq!(TranslationState::from_attr(attr), Some(state));
        }
        assert_eq!(TranslationState::Finished.as_attr(), None);
        assert_eq!(TranslationState::from_attr("done"), None);
    }

    #[test]
    fn only_finished_and_unfinished_are_active() {
        assert!(TranslationState::Finished.is_active());
        assert!(TranslationState::Unfinished.is_active());
        assert!(!TranslationState::Obsolete.is_active());
        assert!(!TranslationState::Vanished.is_active());
    }

    #[test]
    fn location_line_numbers() {
        assert_eq!(Location::new("../a.py", 264).line_number(), Some(264));
        let relative = Location {
            filename: None,
            line: Some("+3".into()),
        };
        assert_eq!(relative.line_number(), None);
        let junk = Location {
            filename: Some("x".into()),
            line: Some("abc".into()),
        };
        assert_eq!(junk.line_number(), None);
    }

    #[test]
    fn untranslated_is_not_identity() {
        let empty = Message::new("°", "");
        let same = Message::new("°", "°");
        assert!(empty.is_untranslated());
        assert!(!same.is_untranslated());
        assert_eq!(same.text(), "°");
    }

    #[test]
    fn numerus_text_clamps() {
        let msg = Message::new("%n segment(s)", "")
            .with_numerus_forms(["%n segment", "%n segmenten"]);
        assert!(msg.numerus);
        assert_eq!(msg.text(), "%n segment");
        assert_eq!(msg.numerus_text(1), "%n segmenten");
        assert_eq!(msg.numerus_text(7), "%n segmenten");

        let blank = Message::new("x", "").with_numerus_forms(["", ""]);
        assert!(blank.is_untranslated());
    }

    #[test]
    fn resolution_policy() {
        assert_eq!(Resolution::Translated("Rotatie").or_source("Rotation"), "Rotatie");
        assert_eq!(Resolution::Untranslated.or_source("Rotation"), "Rotation");
        assert_eq!(Resolution::Missing.or_source("Rotation"), "Rotation");
    }

    #[test]
    fn serializes_state_lowercase() {
        let json = serde_json::to_string(&TranslationState::Unfinished).unwrap();
        assert_eq!(json, "\"unfinished\"");
    }
}
