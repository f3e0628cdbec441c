pub mod resolver;
pub mod table;

pub use resolver::SelectorResolver;
pub use table::{Namespace, SelectorCandidate, SelectorConfigError, SelectorTable};
