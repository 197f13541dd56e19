use quill_core::SessionId;

pub const DEFAULT_WORD_LIMIT: &str = "1000";

/// Character count used for classification: surrounding whitespace excluded.
pub fn count_chars(text: &str) -> usize {
    text.trim().chars().count()
}

/// State of one continuation thread.
///
/// `original_text` and `text_length` are fixed at creation. The segment
/// history only grows by push, except for the single trailing pop a restart
/// performs.
#[derive(Clone, Debug)]
pub struct Session {
    id: SessionId,
    original_text: String,
    text_length: usize,
    additional_requirements: String,
    word_limit: String,
    generated_segments: Vec<String>,
}

impl Session {
    pub fn new(original_text: String, additional_requirements: String) -> Self {
        let text_length = count_chars(&original_text);
        Self {
            id: SessionId::new(),
            original_text,
            text_length,
            additional_requirements,
            word_limit: DEFAULT_WORD_LIMIT.to_string(),
            generated_segments: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn text_length(&self) -> usize {
        self.text_length
    }

    pub fn additional_requirements(&self) -> &str {
        &self.additional_requirements
    }

    pub fn word_limit(&self) -> &str {
        &self.word_limit
    }

    pub fn segments(&self) -> &[String] {
        &self.generated_segments
    }

    /// Overwrite settings from a request; absent values keep the stored ones.
    pub fn apply_overrides(&mut self, word_limit: Option<String>, requirements: Option<String>) {
        if let Some(limit) = word_limit {
            self.word_limit = limit;
        }
        if let Some(req) = requirements {
            self.additional_requirements = req;
        }
    }

    pub fn push_segment(&mut self, segment: String) {
        self.generated_segments.push(segment);
    }

    pub fn pop_last_segment(&mut self) -> Option<String> {
        self.generated_segments.pop()
    }

    /// All segments in generation order, newline separated.
    pub fn history(&self) -> String {
        self.generated_segments.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_ignores_surrounding_whitespace() {
        assert_eq!(count_chars("  abc \n"), 3);
        assert_eq!(count_chars("夜色 深沉"), 5);
        assert_eq!(count_chars(""), 0);
    }

    #[test]
    fn new_session_defaults() {
        let session = Session::new("  Once upon a time.  ".into(), "darker".into());
        assert_eq!(session.text_length(), 17);
        assert_eq!(session.original_text(), "  Once upon a time.  ");
        assert_eq!(session.word_limit(), DEFAULT_WORD_LIMIT);
        assert_eq!(session.additional_requirements(), "darker");
        assert!(session.segments().is_empty());
        assert!(session.id().as_str().starts_with("sess_"));
    }

    #[test]
    fn overrides_last_value_wins() {
        let mut session = Session::new("text".into(), "first".into());
        session.apply_overrides(Some("500".into()), None);
        assert_eq!(session.word_limit(), "500");
        assert_eq!(session.additional_requirements(), "first");

        session.apply_overrides(None, Some(String::new()));
        assert_eq!(session.word_limit(), "500");
        assert_eq!(session.additional_requirements(), "");
    }

    #[test]
    fn push_pop_and_history() {
        let mut session = Session::new("text".into(), String::new());
        session.push_segment("A".into());
        session.push_segment("B".into());
        assert_eq!(session.history(), "A\nB");
        assert_eq!(session.pop_last_segment(), Some("B".into()));
        assert_eq!(session.segments(), ["A".to_string()]);
        assert_eq!(session.pop_last_segment(), Some("A".into()));
        assert_eq!(session.pop_last_segment(), None);
        assert_eq!(session.history(), "");
    }

    #[test]
    fn text_length_fixed_after_mutation() {
        let mut session = Session::new("abcdef".into(), String::new());
        session.push_segment("a much longer generated segment".into());
        session.apply_overrides(Some("10".into()), Some("req".into()));
        assert_eq!(session.text_length(), 6);
    }
}
