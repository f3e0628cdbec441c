pub mod engine;
pub mod rules;

pub use engine::{evaluate, ContentQualityEngine, QualityReport, RuleMessage};
pub use rules::{RuleSet, RuleSetConfig, RuleSetError};
