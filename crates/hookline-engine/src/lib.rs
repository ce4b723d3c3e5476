pub mod config;
pub mod entitlement;
pub mod generate;
pub mod parser;
pub mod prompt;
pub mod ranking;
pub mod records;
pub mod selection;

pub use config::{EngineConfig, PolicyLimits};
pub use entitlement::{entitlement_from_row, evaluate};
pub use generate::Engine;
pub use parser::parse_hooks;
pub use prompt::{LlmPrompt, build_prompt};
pub use ranking::summarize;
pub use selection::select;
