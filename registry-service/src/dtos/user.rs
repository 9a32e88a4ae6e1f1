use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAddressRequest {
    #[validate(length(max = 512, message = "Address is too long"))]
    #[schema(example = "221B Baker Street, London")]
    pub address: Option<String>,
}
