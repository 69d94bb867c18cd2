pub mod stateless_llm_interface;
pub mod gemini_llm;
pub mod openai_compatible_llm;
pub mod http;
pub mod retry;

pub use stateless_llm_interface::*;
pub use gemini_llm::GeminiLLM;
pub use openai_compatible_llm::OpenAICompatibleLLM;
pub use retry::RetryPolicy;
