use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use snafu::{Location, Snafu};

use crate::catalog::CatalogError;
use crate::enrollment::EnrollmentError;
use crate::model::ParseId;
use crate::progress::StoreError;

#[derive(Debug, Snafu, Serialize)]
#[snafu(visibility(pub(crate)))]
#[serde(tag = "error", content = "data")]
pub enum ApiError {
    #[snafu(display("{source}"))]
    InvalidId {
        #[serde(skip)]
        source: ParseId,
    },

    #[snafu(display("{source}"))]
    Catalog {
        #[serde(skip)]
        source: CatalogError,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    Progress {
        #[serde(skip)]
        source: StoreError,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    Enrollment {
        #[serde(skip)]
        source: EnrollmentError,
        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId { .. } => StatusCode::BAD_REQUEST,
            Self::Catalog {
                source: CatalogError::CourseNotFound { .. },
                ..
            } => StatusCode::NOT_FOUND,
            Self::Progress {
                source: StoreError::MissingKey { .. },
                ..
            } => StatusCode::BAD_REQUEST,
            Self::Enrollment {
                source: EnrollmentError::MissingUser,
                ..
            } => StatusCode::BAD_REQUEST,
            Self::Catalog { .. } | Self::Progress { .. } | Self::Enrollment { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(flatten)]
    data: ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let content = ErrorResponse {
            message: self.to_string(),
            data: self,
        };

        (status, Json(content)).into_response()
    }
}
