use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres_migration::Migration;

use crate::friend_storage::StorageError;

const SCRIPTS_UP: [(&str, &str); 1] = [(
    "0001_create-friends_up",
    include_str!("../migrations/0001_create-friends_up.sql"),
)];

/// Builds the shared pool from a `postgres://` connection string.
pub fn create_pool(database_url: &str, max_size: usize) -> Result<Pool, StorageError> {
    let config = database_url.parse::<tokio_postgres::Config>()?;

    let manager = Manager::from_config(
        config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Ok(Pool::new(manager, max_size))
}

pub async fn migrate_up(pool: &Pool) -> Result<(), StorageError> {
    let mut client = pool.get().await?;

    let migration = Migration::new("migrations".to_string());
    migration.up(&mut **client, &SCRIPTS_UP).await?;

    log::info!("Postgres migrations applied");
    Ok(())
}
