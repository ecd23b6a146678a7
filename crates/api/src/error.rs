use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::LinkUnavailable;
use domain::LinkError;
use persistence::RepositoryError;
use serde::Serialize;
use thiserror::Error;

/// Generic message returned for internal failures. Details only go to logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "حدث خطأ في الخادم";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invitation link is inactive")]
    LinkInactive,

    #[error("Invitation link has expired")]
    LinkExpired,

    #[error("Invitation link usage limit reached")]
    LinkExhausted,

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<Vec<ValidationDetail>>,
    },

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Validation failure without per-field details.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Machine-readable error code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::LinkInactive => "link_inactive",
            ApiError::LinkExpired => "link_expired",
            ApiError::LinkExhausted => "link_exhausted",
            ApiError::Validation { .. } => "validation_error",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::LinkInactive => StatusCode::CONFLICT,
            ApiError::LinkExpired | ApiError::LinkExhausted => StatusCode::GONE,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code();

        let (message, details) = match self {
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
            ApiError::LinkInactive => (LinkUnavailable::Inactive.label().to_string(), None),
            ApiError::LinkExpired => (LinkUnavailable::Expired.label().to_string(), None),
            ApiError::LinkExhausted => (LinkUnavailable::Exhausted.label().to_string(), None),
            ApiError::Validation { message, details } => (message, details),
            ApiError::RateLimited => (
                "عدد الطلبات كبير، يرجى المحاولة لاحقاً".to_string(),
                None,
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (INTERNAL_ERROR_MESSAGE.to_string(), None)
            }
        };

        let body = ErrorBody {
            success: false,
            error,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LinkUnavailable> for ApiError {
    fn from(reason: LinkUnavailable) -> Self {
        match reason {
            LinkUnavailable::Expired => ApiError::LinkExpired,
            LinkUnavailable::Exhausted => ApiError::LinkExhausted,
            LinkUnavailable::Inactive => ApiError::LinkInactive,
        }
    }
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::NotFound => ApiError::NotFound("الرابط غير موجود".into()),
            LinkError::Unavailable(reason) => reason.into(),
            LinkError::EmailTaken => {
                ApiError::Conflict("البريد الإلكتروني مسجل مسبقاً".into())
            }
            LinkError::InvalidUsageCap { used, requested } => ApiError::Validation {
                message: format!(
                    "لا يمكن تحديد عدد مرات الاستخدام ({}) بأقل من عدد مرات الاستخدام الحالية ({})",
                    requested, used
                ),
                details: Some(vec![ValidationDetail {
                    field: "usages".into(),
                    message: format!("يجب ألا يقل عن {}", used),
                }]),
            },
            LinkError::TokenGeneration => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Link(link_err) => link_err.into(),
            RepositoryError::Database(db_err) => db_err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("المورد غير موجود".into()),
            sqlx::Error::Database(db_err) => {
                constraint_error(db_err.code().as_deref(), db_err.message())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Maps a Postgres SQLSTATE to the client-facing error.
fn constraint_error(code: Option<&str>, message: &str) -> ApiError {
    match code {
        Some("23503") => ApiError::Conflict("السجل المرتبط غير موجود".into()),
        Some("23505") => ApiError::Conflict("المورد موجود مسبقاً".into()),
        Some("23514") => ApiError::validation("القيمة المدخلة تخالف قيود البيانات"),
        _ => ApiError::Internal(format!("Database error: {}", message)),
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            "البيانات المدخلة غير صحيحة".to_string()
        };

        ApiError::Validation {
            message,
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_table() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "unauthorized"),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN, "forbidden"),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT, "conflict"),
            (ApiError::LinkInactive, StatusCode::CONFLICT, "link_inactive"),
            (ApiError::LinkExpired, StatusCode::GONE, "link_expired"),
            (ApiError::LinkExhausted, StatusCode::GONE, "link_exhausted"),
            (ApiError::validation("x"), StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        ];
        for (error, status, code) in cases {
            assert_eq!(error.status(), status, "{}", code);
            assert_eq!(error.code(), code);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, json) = body_json(ApiError::NotFound("الرابط غير موجود".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "not_found");
        assert_eq!(json["message"], "الرابط غير موجود");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, json) =
            body_json(ApiError::Internal("connection refused at 10.0.0.5".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!json.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_link_state_messages() {
        let (status, json) = body_json(LinkUnavailable::Expired.into()).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(json["error"], "link_expired");
        assert_eq!(json["message"], LinkUnavailable::Expired.label());
    }

    #[test]
    fn test_from_link_error() {
        assert!(matches!(ApiError::from(LinkError::NotFound), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from(LinkError::EmailTaken), ApiError::Conflict(_)));
        assert!(matches!(
            ApiError::from(LinkError::Unavailable(LinkUnavailable::Exhausted)),
            ApiError::LinkExhausted
        ));
        assert!(matches!(
            ApiError::from(LinkError::InvalidUsageCap { used: 5, requested: 2 }),
            ApiError::Validation { .. }
        ));
        assert!(matches!(
            ApiError::from(LinkError::TokenGeneration),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_constraint_codes() {
        assert!(matches!(
            constraint_error(Some("23503"), "violates foreign key constraint"),
            ApiError::Conflict(_)
        ));
        assert!(matches!(constraint_error(Some("23505"), "dup"), ApiError::Conflict(_)));
        assert!(matches!(
            constraint_error(Some("23514"), "check"),
            ApiError::Validation { .. }
        ));
        assert!(matches!(constraint_error(Some("40001"), "serialization"), ApiError::Internal(_)));
        assert!(matches!(constraint_error(None, "boom"), ApiError::Internal(_)));
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 1, max = 100, message = "خارج النطاق"))]
        usages: i32,
        #[validate(length(min = 1, message = "مطلوب"))]
        institution: String,
    }

    #[tokio::test]
    async fn test_from_validation_errors_lists_fields() {
        let sample = Sample {
            usages: 0,
            institution: String::new(),
        };
        let error: ApiError = sample.validate().unwrap_err().into();
        let (status, json) = body_json(error).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let details = json["details"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0]["field"], "institution");
        assert_eq!(details[1]["field"], "usages");
        assert_eq!(details[1]["message"], "خارج النطاق");
    }
}
