pub mod builder;
pub mod composer;
pub mod config;
pub mod error;
pub mod phase;
pub mod session;
pub mod tokens;

pub use builder::ChatSessionBuilder;
pub use composer::PromptComposer;
pub use config::SessionConfig;
pub use error::{SessionRejection, StreamFailure};
pub use phase::{SessionOutcome, SessionPhase};
pub use session::{ChatSession, ValidatedSession};
pub use tokens::TokenCounter;
