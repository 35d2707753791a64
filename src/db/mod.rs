use mongodb::{Client, Database};
use rocket::fairing::AdHoc;
use log::{error, info};
use std::ops::Deref;

/// Managed handle to the database. Keeps the client around so handlers can
/// open `ClientSession`s for the multi-step lifecycle writes.
pub struct DbConn {
    pub client: Client,
    pub database: Database,
}

impl Deref for DbConn {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.database
    }
}

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(conn) => {
                info!("✓ MongoDB connected successfully");
                rocket.manage(conn)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<DbConn, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await?;

    let database = client.database(&crate::config::Config::mongodb_db());
    Ok(DbConn { client, database })
}
