pub mod manager;
pub mod mapping;
pub mod sqlite;

pub use manager::DatabaseManager;
pub use sqlite::{
    SqliteCreatorLinkRepository, SqlitePlaceRepository, SqliteReportRepository,
    SqliteSubjectObjectRepository, SqliteWorkerRepository,
};
