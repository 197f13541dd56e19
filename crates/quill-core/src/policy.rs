use serde::{Deserialize, Serialize};

/// What happens to the segment a restart removed when the regeneration
/// does not complete (upstream failure or client disconnect).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartRollback {
    /// The removed segment stays removed.
    #[default]
    Discard,
    /// The removed segment is pushed back onto the history.
    Restore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_discard() {
        assert_eq!(RestartRollback::default(), RestartRollback::Discard);
    }

    #[test]
    fn serde_names() {
        let p: RestartRollback = serde_json::from_str("\"restore\"").unwrap();
        assert_eq!(p, RestartRollback::Restore);
        assert_eq!(
            serde_json::to_string(&RestartRollback::Discard).unwrap(),
            "\"discard\""
        );
    }
}
