use garde::Validate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 200))]
    pub full_name: String,

    #[garde(length(min = 3, max = 200))]
    pub email: String,

    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[garde(length(min = 3, max = 200))]
    pub email: String,

    #[garde(length(min = 1))]
    pub password: String,
}

/// Bearer credential handed back after a successful login.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRequest {
    #[garde(length(min = 1, max = 512))]
    pub push_token: String,
}
