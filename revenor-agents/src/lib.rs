pub mod llm;
pub mod review;

pub use llm::client::OpenAiClient;
pub use review::agent::{MessageSink, ReviewAgent, TransactionReviewer};
pub use review::types::ReviewOutcome;
