//! Account (ONG) data models and API request/response types.
//!
//! An account is an organisation unit operating the system: the front desk,
//! a department, or an administrator. Its id is also the bearer token clients
//! send on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::validation::{self, ValidationError};

/// Sector allowed to confirm appointments besides administrators.
pub const SECURITY_SECTOR: i32 = 4;

/// Represents an account record from the `ongs` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    /// 8 lowercase hex characters
    pub id: String,

    pub name: String,

    /// Unique across accounts
    pub email: String,

    pub whatsapp: String,

    pub city: String,

    /// Two-letter state code
    pub uf: String,

    /// `ADM` or `USER`
    pub role: String,

    /// Sector this account belongs to
    pub sector_id: i32,

    pub created_at: DateTime<Utc>,
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Role {
    #[serde(rename = "ADM")]
    Admin,
    #[default]
    #[serde(rename = "USER")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADM",
            Role::User => "USER",
        }
    }

    /// Parse the column value; anything unknown is treated as a plain user.
    pub fn from_column(value: &str) -> Self {
        match value {
            "ADM" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Request body for registering an account.
///
/// ```json
/// {
///   "name": "Portaria Central",
///   "email": "portaria@empresa.com.br",
///   "whatsapp": "11987654321",
///   "city": "São Paulo",
///   "uf": "SP",
///   "role": "USER",
///   "sector_id": 4
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub city: String,
    pub uf: String,

    /// Defaults to `USER`
    #[serde(default)]
    pub role: Role,

    pub sector_id: i32,
}

impl CreateAccountRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name, 120)?;
        validation::email(&self.email)?;
        validation::phone("whatsapp", &self.whatsapp)?;
        validation::required("city", &self.city, 80)?;
        validation::uf(&self.uf)?;
        validation::sector(self.sector_id)
    }
}

/// Response for a newly registered account. The id is shown so the client
/// can keep it as its login token.
#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub id: String,
}

/// Request body for `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub id: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub name: String,
    pub role: String,
    pub sector_id: i32,
}

impl From<Account> for SessionResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            role: account.role,
            sector_id: account.sector_id,
        }
    }
}

/// Generate a new account id: 4 random bytes, hex encoded.
pub fn generate_account_id() -> String {
    let bytes: [u8; 4] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateAccountRequest {
        CreateAccountRequest {
            name: "Portaria Central".into(),
            email: "portaria@empresa.com.br".into(),
            whatsapp: "11987654321".into(),
            city: "São Paulo".into(),
            uf: "SP".into(),
            role: Role::User,
            sector_id: SECURITY_SECTOR,
        }
    }

    #[test]
    fn generated_ids_are_eight_hex_chars() {
        let id = generate_account_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn role_defaults_to_user_when_omitted() {
        let body = r#"{"name":"RH","email":"rh@empresa.com","whatsapp":"1133334444","city":"Recife","uf":"PE","sector_id":2}"#;
        let parsed: CreateAccountRequest = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.role, Role::User);

        let admin: Role = serde_json::from_str(r#""ADM""#).unwrap();
        assert_eq!(admin, Role::Admin);
        assert_eq!(Role::from_column(admin.as_str()), Role::Admin);
        assert_eq!(Role::from_column("guest"), Role::User);
    }

    #[test]
    fn validate_checks_every_field() {
        assert!(request().validate().is_ok());

        let mut bad_uf = request();
        bad_uf.uf = "São Paulo".into();
        assert!(bad_uf.validate().is_err());

        let mut bad_sector = request();
        bad_sector.sector_id = 0;
        assert!(bad_sector.validate().is_err());

        let mut bad_email = request();
        bad_email.email = "portaria".into();
        assert!(bad_email.validate().is_err());
    }
}
