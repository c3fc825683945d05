// connexion BD + migrations

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Ouvre la connexion et applique les migrations en attente
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    // SQLite en mémoire : une seule connexion, sinon chaque connexion voit une base vide
    if database_url.starts_with("sqlite::memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;

    log::info!("Running database migrations...");
    Migrator::up(&db, None).await?;
    log::info!("Database migrations completed");

    Ok(db)
}
