use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMealPlanRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub additional_instructions: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
