pub mod extraction;
pub mod structuring; // LLM-backed extraction
pub mod ordering; // Legacy payload + order submission
pub mod processor;
