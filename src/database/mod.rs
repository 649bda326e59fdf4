use std::ops::Deref;

use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use url::Url;

/// Helper for executing raw SurrealQL with bound parameters.
pub mod query;

pub use query::{Bindings, QueryError};

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

const SETUP: &str = include_str!("../../schema.surrealql");

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{url}`: {source}"))]
    Connection {
        url: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot sign in to the database `{url}` as `{username}`: {source}"))]
    Signin {
        url: Url,
        username: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot select namespace `{namespace}` / database `{database}`: {source}"))]
    Namespace {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to apply the database schema: {source}"))]
    Schema {
        source: QueryError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url", default = "default_url")]
    pub url: Url,
    #[serde(rename = "surreal_ns", default = "default_name")]
    pub namespace: String,
    #[serde(rename = "surreal_db", default = "default_name")]
    pub database: String,
    #[serde(rename = "surreal_user", default)]
    pub username: Option<String>,
    #[serde(rename = "surreal_pass", default)]
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            namespace: default_name(),
            database: default_name(),
            username: None,
            password: None,
        }
    }
}

fn default_url() -> Url {
    Url::parse("mem://").expect("`mem://` is a valid url")
}

fn default_name() -> String {
    "lectern".to_string()
}

/// Shared handle to the SurrealDB connection. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Surreal<Any>,
}

impl Database {
    /// Connects, signs in when credentials are configured, selects the
    /// namespace/database and applies the schema.
    #[tracing::instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let inner = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .context(ConnectionSnafu {
                url: config.url.clone(),
            })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            inner
                .signin(Root { username, password })
                .await
                .context(SigninSnafu {
                    url: config.url.clone(),
                    username: username.clone(),
                })?;
        }

        inner
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .context(NamespaceSnafu {
                namespace: config.namespace.clone(),
                database: config.database.clone(),
            })?;

        let database = Self { inner };
        database.sql(SETUP).execute().await.context(SchemaSnafu)?;

        tracing::info!(namespace = %config.namespace, database = %config.database, "connected to database");
        Ok(database)
    }

    /// A fresh, empty in-process database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::default()).await
    }

    /// Create a builder to execute arbitrary SurrealQL on the database.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let courses: Vec<CourseRecord> = db
    ///     .sql("SELECT * FROM courses WHERE level = $level")
    ///     .bind(("level", "Beginner"))
    ///     .fetch_first()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: &str) -> Bindings<'_> {
        Bindings::new(self.inner.query(query))
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
