//! Read-only access to the application database
//!
//! The export job never writes; connections are opened with mode=ro plus
//! immutable=1 so SQLite will not touch the file even for internal
//! bookkeeping.

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::path::Path;

pub mod models;
pub mod queries;

pub use models::{Core, ImageType, ReviewStep, Slide};

/// Connect to the application database in read-only mode.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "database not found: {}",
            db_path.display()
        )));
    }

    let db_url = format!("sqlite://{}?mode=ro&immutable=1", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;

    Ok(pool)
}
