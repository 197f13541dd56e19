/// Request-supplied values that replace the session's stored ones.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub word_limit: Option<String>,
    pub requirements: Option<String>,
}

/// One generation request against a session.
#[derive(Clone, Debug)]
pub enum Operation {
    /// First segment, using the settings stored at submit.
    Initial,
    /// Append a segment after the existing history.
    Continue(Overrides),
    /// Replace the last segment.
    Restart(Overrides),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Initial => OperationKind::Initial,
            Self::Continue(_) => OperationKind::Continue,
            Self::Restart(_) => OperationKind::Restart,
        }
    }

    pub fn overrides(&self) -> Option<&Overrides> {
        match self {
            Self::Initial => None,
            Self::Continue(o) | Self::Restart(o) => Some(o),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Initial,
    Continue,
    Restart,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Continue => "continue",
            Self::Restart => "restart",
        }
    }

    pub(crate) fn summarizing_status(self) -> &'static str {
        match self {
            Self::Restart => "Re-summarizing source text...",
            _ => "Summarizing source text...",
        }
    }

    pub(crate) fn summary_done_status(self) -> &'static str {
        match self {
            Self::Restart => "Summary complete, regenerating continuation...",
            _ => "Summary complete, starting continuation...",
        }
    }

    pub(crate) fn generating_status(self) -> &'static str {
        match self {
            Self::Initial => "Generating continuation...",
            Self::Continue => "Continuing story...",
            Self::Restart => "Regenerating continuation...",
        }
    }

    pub(crate) fn complete_message(self) -> &'static str {
        match self {
            Self::Initial => "Continuation complete",
            Self::Continue => "Continue complete",
            Self::Restart => "Regeneration complete",
        }
    }

    pub(crate) fn error_message(self, detail: &str) -> String {
        match self {
            Self::Initial => format!("Error during continuation: {detail}"),
            Self::Continue => format!("Error while continuing: {detail}"),
            Self::Restart => format!("Error while regenerating: {detail}"),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
