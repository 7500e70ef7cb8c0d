pub mod alerting;
pub mod authority;
pub mod notifier;
pub mod object_store;
pub mod repository;

pub use alerting::*;
pub use authority::*;
pub use notifier::*;
pub use object_store::*;
pub use repository::*;
