use serde_json::Value;

use crate::domain::user::models::EmailAddress;

/// Templated email handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub template: String,
    pub data: Value,
}
