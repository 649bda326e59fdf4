use axum::routing::{get, put};
use axum::Router;
use tower_http::trace::TraceLayer;

mod error;
mod routes;
mod state;

pub use error::*;
pub use state::{create_app, App};

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

pub fn create_router(app: App) -> Router {
    use routes::{courses, enrollments, progress};

    Router::new()
        .route("/courses", get(courses::list))
        .route("/courses/:course_id", get(courses::find))
        .route("/users/:user_id/progress", get(progress::all))
        .route("/users/:user_id/progress/:video_id", put(progress::save))
        .route("/users/:user_id/courses/:course_id/progress", get(progress::course))
        .route("/users/:user_id/enrollments", get(enrollments::list))
        .route(
            "/users/:user_id/enrollments/:course_id",
            put(enrollments::enroll).delete(enrollments::unenroll),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}
