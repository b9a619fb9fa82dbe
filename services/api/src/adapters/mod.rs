pub mod advisory_llm;

pub use advisory_llm::OpenAiAdvisoryAdapter;
