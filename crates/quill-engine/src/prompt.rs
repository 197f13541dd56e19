//! Writing prompt templates.
//!
//! Every template ends with the optional requirements clause followed by the
//! target length clause, in that order.

/// Clauses shared by every template.
#[derive(Clone, Copy, Debug)]
pub struct Trailer<'a> {
    pub requirements: &'a str,
    pub word_limit: &'a str,
}

impl Trailer<'_> {
    fn append_to(&self, prompt: &mut String) {
        if !self.requirements.is_empty() {
            prompt.push_str("\n\nAdditional requirements: ");
            prompt.push_str(self.requirements);
        }
        prompt.push_str("\n\nTarget length: ");
        prompt.push_str(self.word_limit);
        prompt.push_str(" words");
    }
}

fn finish(mut body: String, trailer: Trailer<'_>) -> String {
    trailer.append_to(&mut body);
    body
}

/// Continue straight from the original text.
pub fn initial_direct(original: &str, trailer: Trailer<'_>) -> String {
    finish(format!("Continue the following story:\n\n{original}"), trailer)
}

/// Continue from a summary of the original text.
pub fn initial_summarized(summary: &str, trailer: Trailer<'_>) -> String {
    finish(
        format!("Continue the story based on the following summary:\n\n{summary}"),
        trailer,
    )
}

/// Extend the story past everything generated so far.
pub fn continuation(original: &str, history: &str, trailer: Trailer<'_>) -> String {
    finish(
        format!(
            "Below are the original story and the continuation written so far:\n\n\
             Original:\n{original}\n\n\
             Continuation so far:\n{history}\n\n\
             Please continue writing."
        ),
        trailer,
    )
}

/// Regenerate the final part. An empty history falls back to
/// [`initial_direct`], since there is nothing to rewrite.
pub fn restart(original: &str, history: &str, trailer: Trailer<'_>) -> String {
    if history.is_empty() {
        return initial_direct(original, trailer);
    }
    finish(
        format!(
            "Rewrite the continuation of the following story:\n\n\
             Original:\n{original}\n\n\
             Existing continuation:\n{history}\n\n\
             Please rewrite the final part."
        ),
        trailer,
    )
}

/// Input handed to the summarizer when a restart re-summarizes.
pub fn restart_summary_source(original: &str, history: &str) -> String {
    if history.is_empty() {
        original.to_string()
    } else {
        format!("{original}\n\n{history}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: Trailer<'static> = Trailer {
        requirements: "",
        word_limit: "1000",
    };

    #[test]
    fn direct_without_requirements() {
        assert_eq!(
            initial_direct("It was dark.", PLAIN),
            "Continue the following story:\n\nIt was dark.\n\nTarget length: 1000 words"
        );
    }

    #[test]
    fn requirements_precede_length() {
        let prompt = initial_summarized(
            "A summary.",
            Trailer {
                requirements: "keep it short",
                word_limit: "300",
            },
        );
        assert_eq!(
            prompt,
            "Continue the story based on the following summary:\n\nA summary.\
             \n\nAdditional requirements: keep it short\n\nTarget length: 300 words"
        );
    }

    #[test]
    fn continuation_embeds_original_and_history() {
        let prompt = continuation("Orig.", "A\nB", PLAIN);
        assert!(prompt.starts_with("Below are the original story"));
        assert!(prompt.contains("Original:\nOrig.\n\nContinuation so far:\nA\nB\n\nPlease continue writing."));
        assert!(prompt.ends_with("Target length: 1000 words"));
    }

    #[test]
    fn restart_with_history() {
        let prompt = restart("Orig.", "A", PLAIN);
        assert!(prompt.contains("Existing continuation:\nA\n\nPlease rewrite the final part."));
    }

    #[test]
    fn restart_without_history_degrades() {
        assert_eq!(restart("Orig.", "", PLAIN), initial_direct("Orig.", PLAIN));
    }

    #[test]
    fn summary_source_joins_history() {
        assert_eq!(restart_summary_source("Orig.", ""), "Orig.");
        assert_eq!(restart_summary_source("Orig.", "A\nB"), "Orig.\n\nA\nB");
    }
}
