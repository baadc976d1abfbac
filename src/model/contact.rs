//! Contact model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_timestamp, CompanyKey};

/// A person in the CRM.
///
/// `company` is free text, not a reference: grouping happens on
/// [`CompanyKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// "First Last", whichever parts are present.
    #[must_use]
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn company_key(&self) -> Option<CompanyKey> {
        self.company.as_deref().and_then(CompanyKey::normalize)
    }
}

/// Validated input for creating a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
}

/// Validated partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
}

impl ContactPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.title.is_none()
            && self.address.is_none()
            && self.company.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: Option<&str>, last: Option<&str>) -> Contact {
        Contact {
            id: "ct_1".to_string(),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: None,
            phone: None,
            title: None,
            address: None,
            company: Some(" Acme Inc. ".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(contact(Some("Ava"), Some("Nowak")).display_name(), "Ava Nowak");
        assert_eq!(contact(None, Some("Nowak")).display_name(), "Nowak");
        assert_eq!(contact(None, None).display_name(), "");
    }

    #[test]
    fn test_company_key() {
        let key = contact(Some("Ava"), None).company_key().unwrap();
        assert_eq!(key.as_str(), "acme inc.");
    }

    #[test]
    fn test_bad_timestamps_decode_as_missing() {
        let json = r#"{"id":"ct_1","first_name":"Ava","updated_at":"not a date"}"#;
        let decoded: Contact = serde_json::from_str(json).unwrap();
        assert!(decoded.updated_at.is_none());
        assert!(decoded.created_at.is_none());
        assert!(decoded.company.is_none());
    }
}
