pub mod config;
pub mod error;
pub mod fetch;
pub mod github;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod scanner;
pub mod validate;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{Finding, ScanOption, ScanOutput, VulnerabilityReport};
pub use pipeline::{execute, Outcome, Run};
