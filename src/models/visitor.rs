//! Visitor data models and API request/response types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::validation::{self, ValidationError};

/// Visitors listed per page by `GET /visitors`.
pub const PAGE_SIZE: i64 = 10;

/// Represents a visitor record from the `visitors` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Visitor {
    pub id: Uuid,

    /// Account that registered the visitor
    pub ong_id: String,

    pub name: String,
    pub rg: String,

    /// 11 bare digits
    pub cpf: String,

    pub birthdate: Option<NaiveDate>,
    pub email: Option<String>,
    pub cellphone: String,
    pub company: Option<String>,

    /// Sector being visited
    pub sector_id: i32,

    /// Person being visited
    pub host: String,

    pub observation: Option<String>,

    /// Blocked visitors are refused at check-in
    pub blocked: bool,
    pub blocked_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or updating a visitor.
///
/// ```json
/// {
///   "name": "Maria Silva",
///   "rg": "12.345.678-9",
///   "cpf": "529.982.247-25",
///   "birthdate": "1990-05-17",
///   "email": "maria@example.com",
///   "cellphone": "11987654321",
///   "company": "ACME",
///   "sector_id": 2,
///   "host": "João",
///   "observation": "Entrega de documentos"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct VisitorRequest {
    pub name: String,
    pub rg: String,
    pub cpf: String,
    pub birthdate: Option<NaiveDate>,
    pub email: Option<String>,
    pub cellphone: String,
    pub company: Option<String>,
    pub sector_id: i32,
    pub host: String,
    pub observation: Option<String>,
}

impl VisitorRequest {
    /// Validate the body and normalise the CPF to bare digits.
    pub fn validate(&mut self, today: NaiveDate) -> Result<(), ValidationError> {
        validation::required("name", &self.name, 120)?;
        validation::required("rg", &self.rg, 20)?;
        self.cpf = validation::cpf(&self.cpf)?;
        if let Some(email) = self.email.as_deref() {
            validation::email(email)?;
        }
        validation::phone("cellphone", &self.cellphone)?;
        validation::optional("company", self.company.as_deref(), 120)?;
        validation::sector(self.sector_id)?;
        validation::required("host", &self.host, 120)?;
        validation::optional("observation", self.observation.as_deref(), 500)?;

        if self.birthdate.is_some_and(|date| date > today) {
            return Err(ValidationError::InvalidFormat {
                field: "birthdate",
                reason: "cannot be in the future",
            });
        }
        Ok(())
    }
}

/// Request body for `PUT /visitors/{id}/block`.
#[derive(Debug, Deserialize)]
pub struct BlockVisitorRequest {
    pub blocked: bool,
    pub reason: Option<String>,
}

impl BlockVisitorRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.blocked {
            validation::optional("reason", self.reason.as_deref(), 500)?;
        }
        Ok(())
    }
}

/// Query string for `GET /visitors`.
#[derive(Debug, Default, Deserialize)]
pub struct VisitorListQuery {
    /// 1-based page number
    pub page: Option<i64>,

    /// Matches the name (case-insensitive) or the CPF digits
    pub search: Option<String>,
}

impl VisitorListQuery {
    /// Row offset for the requested page; pages below 1 are clamped to 1
    /// and offsets past `i64::MAX` saturate.
    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1).saturating_mul(PAGE_SIZE)
    }

    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// `ILIKE` pattern matched against the name, if a search term is given.
    pub fn name_pattern(&self) -> Option<String> {
        self.search_term().map(|s| {
            format!(
                "%{}%",
                s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
            )
        })
    }

    /// `LIKE` pattern matched against the stored CPF digits.
    ///
    /// Only terms written like a CPF (`529.982`, `24725`) produce one; the
    /// punctuation is dropped since CPFs are stored as bare digits.
    pub fn cpf_pattern(&self) -> Option<String> {
        self.search_term()
            .and_then(validation::cpf_search_digits)
            .map(|digits| format!("%{digits}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn request() -> VisitorRequest {
        VisitorRequest {
            name: "Maria Silva".into(),
            rg: "12.345.678-9".into(),
            cpf: "529.982.247-25".into(),
            birthdate: NaiveDate::from_ymd_opt(1990, 5, 17),
            email: Some("maria@example.com".into()),
            cellphone: "(11) 98765-4321".into(),
            company: None,
            sector_id: 2,
            host: "João".into(),
            observation: None,
        }
    }

    #[test]
    fn validate_normalises_cpf() {
        let mut req = request();
        req.validate(today()).unwrap();
        assert_eq!(req.cpf, "52998224725");
    }

    #[test]
    fn validate_rejects_invalid_cpf_and_future_birthdate() {
        let mut req = request();
        req.cpf = "123.456.789-00".into();
        assert!(req.validate(today()).is_err());

        let mut req = request();
        req.birthdate = NaiveDate::from_ymd_opt(2030, 1, 1);
        assert!(req.validate(today()).is_err());
    }

    #[test]
    fn validate_requires_host() {
        let mut req = request();
        req.host = String::new();
        assert_eq!(
            req.validate(today()),
            Err(ValidationError::Empty { field: "host" })
        );
    }

    #[test]
    fn pagination_offset_clamps_to_first_page() {
        let query = |page| VisitorListQuery { page, search: None };
        assert_eq!(query(None).offset(), 0);
        assert_eq!(query(Some(0)).offset(), 0);
        assert_eq!(query(Some(3)).offset(), 2 * PAGE_SIZE);
        assert_eq!(query(Some(i64::MIN)).offset(), 0);
        assert_eq!(query(Some(i64::MAX)).offset(), i64::MAX);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let query = VisitorListQuery {
            page: None,
            search: Some(" 50%_off ".into()),
        };
        assert_eq!(query.name_pattern().as_deref(), Some("%50\\%\\_off%"));
        assert!(query.cpf_pattern().is_none());

        let blank = VisitorListQuery {
            page: None,
            search: Some("  ".into()),
        };
        assert!(blank.name_pattern().is_none());
        assert!(blank.cpf_pattern().is_none());
    }

    #[test]
    fn punctuated_cpf_search_matches_stored_digits() {
        let query = |term: &str| VisitorListQuery {
            page: None,
            search: Some(term.into()),
        };
        assert_eq!(query("529.982").cpf_pattern().as_deref(), Some("%529982%"));
        assert_eq!(query(" 247-25 ").cpf_pattern().as_deref(), Some("%24725%"));
        assert!(query("Maria").cpf_pattern().is_none());
        assert_eq!(query("Maria").name_pattern().as_deref(), Some("%Maria%"));
    }
}
