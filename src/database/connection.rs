use mongodb::bson::doc;
use mongodb::{Client, Database};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Connects and pings the database so an unreachable server fails startup
/// instead of every later request.
pub async fn get_db_client(config: &AppConfig) -> Result<Database> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::configuration("DATABASE_URL must be set"))?;

    let client = Client::with_uri_str(database_url)
        .await
        .map_err(|e| AppError::configuration(format!("Invalid DATABASE_URL: {}", e)))?;

    let db = client.database(&config.database_name);

    match db.run_command(doc! { "ping": 1 }).await {
        Ok(_) => {
            tracing::info!("✅ Connected to database: {}", config.database_name);
            Ok(db)
        }
        Err(e) => {
            tracing::error!("❌ Database '{}' is unreachable: {}", config.database_name, e);
            Err(AppError::Database {
                context: "Database connection failed",
                source: e.into(),
            })
        }
    }
}
