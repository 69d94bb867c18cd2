pub mod chatbot_agent;
pub mod main_agent;
pub mod sql_generator_agent;
pub mod validator_agent;

pub use chatbot_agent::ChatbotAgent;
pub use main_agent::MainAgent;
pub use sql_generator_agent::SqlGeneratorAgent;
pub use validator_agent::{ValidationError, ValidationOutcome, ValidatorAgent};
