//! JSON body extractor that runs `validator` rules.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// Deserializes a JSON body and validates it. Malformed bodies, unknown
/// fields and rule violations are all reported as validation errors.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "يجب إرسال البيانات بصيغة JSON".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "صيغة JSON غير صحيحة".to_string(),
        JsonRejection::JsonDataError(e) => {
            tracing::debug!(error = %e, "Rejected request body");
            format!("البيانات المدخلة غير صحيحة: {}", e.body_text())
        }
        _ => "البيانات المدخلة غير صحيحة".to_string(),
    };
    ApiError::validation(message)
}
