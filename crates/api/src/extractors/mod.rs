//! Request extractors.

pub mod current_user;
pub mod validated_json;

pub use validated_json::ValidatedJson;
