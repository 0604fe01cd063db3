//! Content policy checks
//!
//! The pipeline only depends on [`Policy::check`]; the phrase list below is
//! the baseline and can be swapped for richer classifiers.

/// Policy trait - `true` means the text is allowed
pub trait Policy: Send + Sync {
    fn check(&self, text: &str) -> bool;
}

/// Rejects text containing any forbidden phrase, ignoring case
#[derive(Debug, Clone, Default)]
pub struct PhrasePolicy {
    /// Lowercased at construction
    phrases: Vec<String>,
}

impl PhrasePolicy {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Policy with no forbidden phrases
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Policy for PhrasePolicy {
    fn check(&self, text: &str) -> bool {
        if self.phrases.is_empty() {
            return true;
        }
        let text = text.to_lowercase();
        !self.phrases.iter().any(|p| text.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_match() {
        let policy = PhrasePolicy::new(["Secret Plan"]);
        assert!(!policy.check("here is the SECRET plan"));
        assert!(!policy.check("secret planning"));
        assert!(policy.check("a secret, a plan"));
    }

    #[test]
    fn test_empty_policy_allows_everything() {
        let policy = PhrasePolicy::allow_all();
        assert!(policy.check("anything at all"));
    }

    #[test]
    fn test_empty_phrase_ignored() {
        let policy = PhrasePolicy::new(["", "bad"]);
        assert_eq!(policy.phrases(), &["bad".to_string()]);
        assert!(policy.check("good text"));
    }
}
