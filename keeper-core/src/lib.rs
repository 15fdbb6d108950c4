pub mod archive;
pub mod backup;
pub mod config;
pub mod constants;
pub mod error;
pub mod precision;
pub mod properties;

pub use archive::{ArchiveEngine, CreatedArchive, ExtractReport};
pub use backup::{BackupGuard, BackupPlan, BackupReport, FileOutcome, FileState};
pub use config::AppConfig;
pub use error::{KeeperError, Result};
pub use precision::TimestampPrecision;
