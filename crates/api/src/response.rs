//! Success envelope shared by all JSON endpoints.

use domain::models::LinkPagination;
use serde::Serialize;

/// `{success: true, data?, pagination?, message}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<LinkPagination>,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: None,
            message: message.into(),
        }
    }

    pub fn paginated(data: T, pagination: LinkPagination, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: Some(pagination),
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            pagination: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2], "تم")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["message"], "تم");
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_message_only_envelope() {
        let json = serde_json::to_value(ApiResponse::message("تم حذف الرابط بنجاح")).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_paginated_envelope() {
        let pagination = LinkPagination {
            page: 2,
            per_page: 20,
            total: 41,
        };
        let json = serde_json::to_value(ApiResponse::paginated(Vec::<u8>::new(), pagination, "ok"))
            .unwrap();
        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["total"], 41);
    }
}
