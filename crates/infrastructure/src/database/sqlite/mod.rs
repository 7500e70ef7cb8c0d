pub mod sqlite_creator_link_repository;
pub mod sqlite_place_repository;
pub mod sqlite_report_repository;
pub mod sqlite_subject_object_repository;
pub mod sqlite_worker_repository;

pub use sqlite_creator_link_repository::SqliteCreatorLinkRepository;
pub use sqlite_place_repository::SqlitePlaceRepository;
pub use sqlite_report_repository::SqliteReportRepository;
pub use sqlite_subject_object_repository::SqliteSubjectObjectRepository;
pub use sqlite_worker_repository::SqliteWorkerRepository;
