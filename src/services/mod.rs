pub mod document;
pub mod export;
pub mod llm;
pub mod outline;
pub mod pipeline;
pub mod prompts;
pub mod summarizer;
pub mod writer;
