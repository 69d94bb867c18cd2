pub mod output_types;
pub mod agent_factory;
pub mod stateless_llm_factory;

pub mod agents;
pub mod stateless_llm;

#[cfg(test)]
pub(crate) mod testing;

pub use output_types::*;
pub use agent_factory::*;
pub use stateless_llm_factory::*;
pub use agents::*;
