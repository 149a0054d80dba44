//! `PostgreSQL` Capability Store for the venue booking engine.
//!
//! - [`PostgresCapabilityStore`]: pooled point reads, provisioning writes and
//!   schema migrations
//! - [`PostgresTransaction`]: row locks and conditional updates for slot
//!   claims and seat admission
//!
//! # Example
//!
//! ```no_run
//! use venue_booking_postgres::PostgresCapabilityStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/booking").await?;
//! let store = PostgresCapabilityStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod rows;
mod store;
mod transaction;

pub use store::PostgresCapabilityStore;
pub use transaction::PostgresTransaction;
