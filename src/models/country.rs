// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// A country reference record.
///
/// Countries are fetched once and then served from the store forever
/// (store-is-truth); the `id` is assigned locally at ingest because the
/// remote payload carries no stable identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub flag: Option<String>,
    #[serde(default)]
    pub is_selected: bool,
}

impl Country {
    /// Map a remote record into a stored country, assigning a local id.
    pub fn from_response(response: &CountryResponse) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: response.name.common.clone(),
            flag: response.flag.clone(),
            is_selected: false,
        }
    }
}

impl Record for Country {
    const TABLE: &'static str = "countries";

    fn id(&self) -> Uuid {
        self.id
    }
}

// API response types

/// Wire shape of one entry in the countries list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryResponse {
    pub name: CountryName,
    pub flag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryName {
    pub common: String,
    pub official: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_country_response() {
        let json = r#"[
            {"name": {"common": "Norway", "official": "Kingdom of Norway"}, "flag": "🇳🇴"},
            {"name": {"common": "Chad", "official": "Republic of Chad"}}
        ]"#;

        let parsed: Vec<CountryResponse> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name.common, "Norway");
        assert_eq!(parsed[0].flag.as_deref(), Some("🇳🇴"));
        assert!(parsed[1].flag.is_none());
    }

    #[test]
    fn test_from_response_assigns_local_id() {
        let response = CountryResponse {
            name: CountryName {
                common: "Chad".to_string(),
                official: "Republic of Chad".to_string(),
            },
            flag: None,
        };

        let a = Country::from_response(&response);
        let b = Country::from_response(&response);
        assert_eq!(a.name, "Chad");
        assert_ne!(a.id, b.id); // each ingest gets its own identity
    }
}
