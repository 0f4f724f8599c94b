use std::collections::BTreeMap;

use serde::Deserialize;
use sitedesk_model::{Family, FamilySchema};

use crate::error::ImportError;

/// Column mapping for one import source, loaded from TOML.
///
/// `columns` maps canonical field names to source column headers;
/// `defaults` supplies constant field values applied to every row.
/// The reserved field `external_id` designates the upstream identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportProfile {
    pub name: String,
    pub family: String,
    pub columns: BTreeMap<String, String>,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl ImportProfile {
    pub fn from_toml(input: &str) -> Result<Self, ImportError> {
        let profile: ImportProfile =
            toml::from_str(input).map_err(|e| ImportError::ProfileParse(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn family(&self) -> Result<Family, ImportError> {
        self.family.parse().map_err(ImportError::UnknownFamily)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        let family = self.family()?;
        let schema = FamilySchema::of(family);

        for field in self.columns.keys().chain(self.defaults.keys()) {
            if field != "external_id" && schema.field(field).is_none() {
                return Err(ImportError::ProfileValidation(format!(
                    "family '{family}' has no field '{field}'"
                )));
            }
        }

        // Without both key fields the engine can neither match nor dedup.
        for key in schema.key_fields {
            if !self.columns.contains_key(key) && !self.defaults.contains_key(key) {
                return Err(ImportError::ProfileValidation(format!(
                    "key field '{key}' is not mapped by any column or default"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DODGE_PROFILE: &str = r#"
name = "Dodge weekly export"
family = "job"

[columns]
external_id = "Dodge Number"
name        = "Project Title"
address     = "Address"
value       = "Valuation"
status      = "Stage"

[defaults]
type = "commercial"
"#;

    #[test]
    fn parse_valid_profile() {
        let profile = ImportProfile::from_toml(DODGE_PROFILE).unwrap();
        assert_eq!(profile.name, "Dodge weekly export");
        assert_eq!(profile.family().unwrap(), Family::Job);
        assert_eq!(profile.columns["external_id"], "Dodge Number");
        assert_eq!(profile.defaults["type"], "commercial");
    }

    #[test]
    fn reject_unknown_family() {
        let input = DODGE_PROFILE.replace("family = \"job\"", "family = \"vendor\"");
        let err = ImportProfile::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("vendor"));
    }

    #[test]
    fn reject_field_not_in_family() {
        let input = DODGE_PROFILE.replace(
            "status      = \"Stage\"",
            "square_footage = \"Sq Ft\"",
        );
        let err = ImportProfile::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("square_footage"));
    }

    #[test]
    fn reject_unmapped_key_field() {
        let input = DODGE_PROFILE.replace("address     = \"Address\"\n", "");
        let err = ImportProfile::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn key_field_via_default_is_accepted() {
        // [defaults] is the last table, so the appended line lands there.
        let input = DODGE_PROFILE.replace(
            "address     = \"Address\"",
            "contractor  = \"GC\"",
        ) + "address = \"unknown\"\n";
        let profile = ImportProfile::from_toml(&input).unwrap();
        assert_eq!(profile.defaults["address"], "unknown");
    }
}
