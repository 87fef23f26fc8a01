//! Units compiled in from the `migrations/` directory by `build.rs`.

use super::registry::MigrationRegistry;
use super::types::{Migration, MigrationError};
use sqlx::MySqlPool;

include!(concat!(env!("OUT_DIR"), "/bundled_migrations.rs"));
