//! Plural ("numerus") form selection.
//!
//! A numerus message stores one translation per plural form, in the order
//! the target language's rule defines. [`NumerusRule::form_index`] maps a
//! count to that position.

/// Plural rule families, keyed by language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumerusRule {
    /// No plural distinction (Japanese, Chinese, Korean, ...).
    Single,
    /// `1` → form 0, everything else → form 1 (English, Dutch, German, ...).
    #[default]
    OneOther,
    /// `0` and `1` → form 0, everything else → form 1 (French, Brazilian
    /// Portuguese, ...).
    ZeroOneOther,
    /// Russian, Ukrainian, Belarusian: one / few / many.
    EastSlavic,
    /// Polish: one / few / many, `1` is the only singular.
    Polish,
    /// Czech, Slovak: one / few (2-4) / other.
    Czech,
}

impl NumerusRule {
    /// Pick the rule for a language tag (`"nl"`, `"nl_NL"`, `"ru-RU"`).
    ///
    /// Unknown languages use [`OneOther`](Self::OneOther).
    #[must_use]
    pub fn for_language(tag: &str) -> Self {
        let mut parts = tag.split(['_', '-', '.']);
        let lang = parts.next().unwrap_or_default().to_ascii_lowercase();
        let region = parts.next().unwrap_or_default().to_ascii_uppercase();
        match lang.as_str() {
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" | "tr" => Self::Single,
            "fr" | "ln" | "ak" => Self::ZeroOneOther,
            // Brazilian Portuguese counts 0 as singular; European does not.
            "pt" if region != "PT" => Self::ZeroOneOther,
            "ru" | "uk" | "be" | "sr" | "hr" | "bs" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::Czech,
            _ => Self::OneOther,
        }
    }

    /// Number of forms a complete translation provides.
    #[must_use]
    pub fn form_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::OneOther | Self::ZeroOneOther => 2,
            Self::EastSlavic | Self::Polish | Self::Czech => 3,
        }
    }

    /// Form index for `count`. Negative counts use their magnitude.
    #[must_use]
    pub fn form_index(self, count: i64) -> usize {
        let n = count.unsigned_abs();
        let n10 = n % 10;
        let n100 = n % 100;
        match self {
            Self::Single => 0,
            Self::OneOther => usize::from(n != 1),
            Self::ZeroOneOther => usize::from(n > 1),
            Self::EastSlavic => {
                if n10 == 1 && n100 != 11 {
                    0
                } else if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Polish => {
                if n == 1 {
                    0
                } else if (2..=4).contains(&n10) && !(12..=14).contains(&n100) {
                    1
                } else {
                    2
                }
            }
            Self::Czech => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
        }
    }
}
