use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAdminRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ops@example.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "Adm1nPass!", min_length = 8)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FeedbackRequest {
    #[schema(example = "Review queue")]
    pub subject: Option<String>,

    #[validate(length(min = 1, message = "Message is required"))]
    #[schema(example = "The pending queue needs attention.")]
    pub message: String,
}
