//! `PostgreSQL` stores for Slotbook.
//!
//! Implements [`SlotStore`](slotbook_core::SlotStore) and
//! [`UserStore`](slotbook_core::UserStore) on top of a sqlx `PgPool`. Queries
//! are built at runtime so the crate compiles without a live database.
//!
//! # Example
//!
//! ```no_run
//! use slotbook_postgres::{PgSlotStore, PgUserStore, run_migrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/slotbook").await?;
//! run_migrations(&pool).await?;
//!
//! let slots = PgSlotStore::new(pool.clone());
//! let users = PgUserStore::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod slots;
mod users;

pub use slots::{DEFAULT_LOCK_TIMEOUT, PgSlotStore, PgSlotTransaction};
pub use users::PgUserStore;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns the underlying migration error if a migration fails to apply.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
