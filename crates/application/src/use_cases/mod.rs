pub mod place_resolver;
pub mod report_lifecycle;
pub mod report_orchestrator;
pub mod report_queries;

pub use place_resolver::*;
pub use report_lifecycle::*;
pub use report_orchestrator::*;
pub use report_queries::*;
