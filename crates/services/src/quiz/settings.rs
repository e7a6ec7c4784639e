use quiz_core::paging::DEFAULT_PAGE_SIZE;
use quiz_core::scoring::ScoringPolicy;

/// Tunables applied to every session a service starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizSettings {
    pub page_size: usize,
    pub scoring: ScoringPolicy,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl QuizSettings {
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_ten_questions_per_page() {
        let settings = QuizSettings::default();
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.scoring.pass_threshold(), 50.0);
        assert_eq!(settings.scoring.forced_retake_threshold(), 40.0);
    }

    #[test]
    fn builders_override_fields() {
        let scoring = ScoringPolicy::new(70.0, 30.0).unwrap();
        let settings = QuizSettings::default()
            .with_page_size(5)
            .with_scoring(scoring);
        assert_eq!(settings.page_size, 5);
        assert_eq!(settings.scoring, scoring);
    }
}
