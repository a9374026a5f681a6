//! Translation progress reporting.
//!
//! Counts follow the state a translator sees in an editor: finished,
//! unfinished, untranslated (empty), and obsolete entries are disjoint
//! buckets. `identical` overlaps the others and flags translations that
//! equal their source text, which is legitimate (`"°"`, `"Radius"`) but
//! worth a reviewer's glance.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::model::{Context, TranslationState};

/// Per-context translation counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextCoverage {
    /// Context name.
    pub context: String,
    /// Active messages (not obsolete or vanished).
    pub active: usize,
    /// Active, non-empty, and not marked unfinished.
    pub finished: usize,
    /// Active, non-empty, marked unfinished.
    pub unfinished: usize,
    /// Active with an empty translation.
    pub untranslated: usize,
    /// Obsolete or vanished entries kept for history.
    pub obsolete: usize,
    /// Active translations identical to their source.
    pub identical: usize,
}

impl ContextCoverage {
    fn of(context: &Context) -> Self {
        let mut stats = Self {
            context: context.name.clone(),
            ..Self::default()
        };
        for message in &context.messages {
            if !message.state.is_active() {
                stats.obsolete += 1;
                continue;
            }
            stats.active += 1;
            if message.is_untranslated() {
                stats.untranslated += 1;
                continue;
            }
            if message.state == TranslationState::Unfinished {
                stats.unfinished += 1;
            } else {
                stats.finished += 1;
            }
            if !message.numerus && message.translation == message.source {
                stats.identical += 1;
            }
        }
        stats
    }

    /// Share of active messages that are finished, in percent.
    ///
    /// A context without active messages counts as complete.
    #[must_use]
    pub fn completion_percent(&self) -> f32 {
        percent(self.finished, self.active)
    }
}

/// Coverage for a whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    /// Target language of the catalog.
    pub language: String,
    /// Per-context rows in document order.
    pub contexts: Vec<ContextCoverage>,
    /// Sum over all contexts (its `context` field is empty).
    pub total: ContextCoverage,
}

impl CoverageReport {
    /// Overall completion, in percent.
    #[must_use]
    pub fn completion_percent(&self) -> f32 {
        self.total.completion_percent()
    }

    /// Whether every active message has a finished translation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total.finished == self.total.active
    }
}

fn percent(part: usize, whole: usize) -> f32 {
    if whole == 0 {
        100.0
    } else {
        (part as f32 / whole as f32) * 100.0
    }
}

impl Catalog {
    /// Build a coverage report across all contexts.
    #[must_use]
    pub fn coverage(&self) -> CoverageReport {
        let contexts: Vec<ContextCoverage> =
            self.contexts().iter().map(ContextCoverage::of).collect();
        let mut total = ContextCoverage::default();
        for row in &contexts {
            total.active += row.active;
            total.finished += row.finished;
            total.unfinished += row.unfinished;
            total.untranslated += row.untranslated;
            total.obsolete += row.obsolete;
            total.identical += row.identical;
        }
        CoverageReport {
            language: self.language().to_string(),
            contexts,
            total,
        }
    }

    /// Reference keys that do not resolve to translated text.
    ///
    /// `reference` holds (context, source) pairs, typically the strings the
    /// host code passes to its translate calls. Ambiguous keys count as
    /// missing. The result is sorted and deduplicated.
    #[must_use]
    pub fn missing_messages(&self, reference: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut missing: Vec<(String, String)> = reference
            .iter()
            .filter(|(context, source)| {
                !matches!(
                    self.resolve(context, source, None),
                    Ok(crate::model::Resolution::Translated(_))
                )
            })
            .map(|(context, source)| ((*context).to_string(), (*source).to_string()))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}
