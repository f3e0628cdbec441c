pub mod directories;
pub mod logging;
pub mod profile_lock;
pub mod supervisor;

pub use directories::{ensure_directories, ResolvedPaths};
pub use logging::init_tracing;
pub use profile_lock::ProfileLock;
pub use supervisor::{install_signal_handlers, Interrupt, Supervisor};
