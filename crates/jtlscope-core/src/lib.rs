pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod io;
pub mod report;
pub mod session;

pub use error::JtlError;
pub use session::{Dataset, LogSession};
