//! Prompt assembly and answer generation

pub mod chat;
pub mod prompt;
pub mod sources;

pub use chat::ChatClient;
pub use prompt::PromptAssembler;
pub use sources::dedup_citations;
