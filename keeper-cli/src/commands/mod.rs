mod archive;
mod backup;
mod replace;
mod status;

// Status commands
pub use status::run_status;

// Backup commands
pub use backup::{run_backup, run_check};

// Archive commands
pub use archive::{run_pack, run_unpack, run_verify};

// Replace workflow
pub use replace::run_replace;
