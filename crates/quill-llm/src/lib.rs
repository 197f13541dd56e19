pub mod chat;
pub mod delta;
pub mod sse;
pub mod summarizer;

pub mod mock;

pub use chat::{ChatAgentConfig, ChatCompletionsAgent};
pub use delta::{DeltaStream, WritingAdapter};
pub use mock::{MockAgent, MockResponse};
pub use summarizer::{Summarizer, EMPTY_RESPONSE_PLACEHOLDER};
