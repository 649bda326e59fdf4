use std::ops::Deref;

use derive_new::new;

use crate::catalog::Catalog;
use crate::database::Database;
use crate::enrollment::Enrollments;
use crate::progress::SurrealProgressStore;

#[derive(Debug, Clone, new)]
pub struct App {
    pub catalog: Catalog,
    pub progress: SurrealProgressStore,
    pub enrollments: Enrollments,
}

impl Deref for App {
    type Target = Catalog;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}

pub fn create_app(database: Database) -> App {
    App {
        catalog: Catalog::new(database.clone()),
        progress: SurrealProgressStore::new(database.clone()),
        enrollments: Enrollments::new(database),
    }
}
