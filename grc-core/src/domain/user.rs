// grc-core/src/domain/user.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory entry for people who own policies, approve them or receive notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            display_name: display_name.into(),
            role: None,
            business_unit: None,
        }
    }
}
