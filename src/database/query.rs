use serde::de::DeserializeOwned;
use snafu::{Location, ResultExt, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::QueryResult;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueryError {
    #[snafu(display("the database rejected the query: {source}"))]
    MalformedQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("a statement failed to execute: {source}"))]
    Statement {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to deserialize the database response: {source}"))]
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[cfg(test)]
impl QueryError {
    pub(crate) fn thrown(message: &str) -> Self {
        use snafu::IntoError;

        let source = surrealdb::Error::Db(surrealdb::error::Db::Thrown(message.to_string()));
        StatementSnafu.into_error(source)
    }
}

/// A pending query. Parameters can be bound using [Bindings::bind] which takes any serializable data structure.
///
/// # Example
/// ```ignore
/// let enrolled: Option<EnrollmentRow> = database
///     .sql("SELECT courseIds FROM type::thing('enrollments', $user)")
///     .bind(("user", "ada"))
///     .fetch_first()
///     .await?;
/// ```
#[derive(Debug)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl<'a> Bindings<'a> {
    pub(super) fn new(query: surrealdb::method::Query<'a, Any>) -> Self {
        Self { query }
    }

    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the statements and fail if any one of them failed.
    pub async fn execute(self) -> Result<surrealdb::Response, QueryError> {
        let response = self.query.await.context(MalformedQuerySnafu)?;
        let response = response.check().context(StatementSnafu)?;
        tracing::trace!(statements = response.num_statements(), "executed query");
        Ok(response)
    }

    /// Execute the query and return the first statement's result as a deserialized value.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<T, QueryError>
    where
        usize: QueryResult<T>,
    {
        let mut response = self.query.await.context(MalformedQuerySnafu)?;
        let result = response.take::<T>(0).context(DeserializeSnafu)?;
        Ok(result)
    }

    /// Execute two statements and deserialize both results.
    pub async fn fetch_pair<A, B>(self) -> Result<(A, B), QueryError>
    where
        A: DeserializeOwned,
        B: DeserializeOwned,
        usize: QueryResult<A> + QueryResult<B>,
    {
        let mut response = self.execute().await?;
        let first = response.take::<A>(0).context(DeserializeSnafu)?;
        let second = response.take::<B>(1).context(DeserializeSnafu)?;
        Ok((first, second))
    }
}
