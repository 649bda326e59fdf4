use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use lectern::database::Database;
use lectern::error::{
    ApplicationError, BindAddressSnafu, ConnectDatabaseSnafu, SeedCatalogSnafu, WebServerSnafu,
};
use lectern::{api, catalog, config, logger};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.database)
        .await
        .context(ConnectDatabaseSnafu)?;
    let app = api::create_app(database);

    if config.seed_catalog {
        let courses = catalog::bundled_courses().context(SeedCatalogSnafu)?;
        app.seed_if_empty(&courses).await.context(SeedCatalogSnafu)?;
    }

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;
    tracing::info!(address = %config.host, "serving lectern");

    axum::serve(listener, api::create_router(app))
        .await
        .context(WebServerSnafu)
}
