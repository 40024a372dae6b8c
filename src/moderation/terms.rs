//! Banned-term set and severity classification.

use strum::Display;

const DEFAULT_TERMS: [&str; 14] = [
    "fuck", "shit", "bitch", "damn", "hell", "stupid", "idiot", "moron", "dumb", "retard",
    "asshole", "bastard", "crap", "piss",
];

const SEVERE_TERMS: [&str; 2] = ["retard", "bastard"];
const MODERATE_TERMS: [&str; 5] = ["stupid", "idiot", "moron", "dumb", "asshole"];

/// Class of a banned term. Ordering follows the weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Amount added to a user's warning count for one offending message.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Severity::Mild => 1,
            Severity::Moderate => 2,
            Severity::Severe => 3,
        }
    }

    /// Severity of a single term; terms outside the fixed table are mild.
    #[must_use]
    pub fn of_term(term: &str) -> Self {
        if SEVERE_TERMS.contains(&term) {
            Severity::Severe
        } else if MODERATE_TERMS.contains(&term) {
            Severity::Moderate
        } else {
            Severity::Mild
        }
    }
}

/// Ordered set of lowercase literal substrings.
///
/// Matching is substring containment on the lowercased text, so a term also
/// fires inside longer words ("hell" in "shell").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedTermSet {
    terms: Vec<String>,
}

impl Default for BannedTermSet {
    fn default() -> Self {
        Self::new(DEFAULT_TERMS)
    }
}

impl BannedTermSet {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self { terms: Vec::new() };
        for term in terms {
            set.add(term.as_ref());
        }
        set
    }

    /// Adds a term, returning false if it is blank or already present.
    pub fn add(&mut self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() || self.terms.contains(&term) {
            return false;
        }
        self.terms.push(term);
        true
    }

    /// Removes a term, returning false if it was not present.
    pub fn remove(&mut self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        let before = self.terms.len();
        self.terms.retain(|t| *t != term);
        self.terms.len() != before
    }

    /// Every term contained in `text`, in set order.
    #[must_use]
    pub fn matches(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| lowered.contains(term.as_str()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Highest severity among `matched`, or `None` when nothing matched.
#[must_use]
pub fn max_severity(matched: &[String]) -> Option<Severity> {
    matched.iter().map(|term| Severity::of_term(term)).max()
}
