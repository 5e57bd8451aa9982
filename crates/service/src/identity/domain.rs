use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile returned by the identity provider for a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

impl Profile {
    /// Name shown for the user; falls back to the email's local part.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if !name.is_empty() {
            return name;
        }
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Stored user (business view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

impl From<models::user::Model> for AuthUser {
    fn from(u: models::user::Model) -> Self {
        Self { id: u.id, email: u.email, name: u.name, image: u.image }
    }
}
