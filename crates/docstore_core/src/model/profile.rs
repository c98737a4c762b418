//! Sample user profile model and its patch form.

use crate::model::schema::{FieldKind, FieldSpec, Model};
use serde::{Deserialize, Serialize};

pub const PROFILES_COLLECTION: &str = "profiles";

/// A profile for a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Public identifier; `None` until the store assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    pub name: String,
    pub address: String,
    pub mail: String,
    /// RFC 3339 timestamp, e.g. `1987-07-19T00:00:00`.
    pub birthdate: String,
    pub sex: String,
    pub company: String,
    pub job: String,
    pub ssn: String,
    pub residence: String,
    pub current_location: Vec<f64>,
    pub blood_group: String,
    pub website: Vec<String>,
}

impl Model for Profile {
    const COLLECTION: &'static str = PROFILES_COLLECTION;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("username", FieldKind::String),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("address", FieldKind::String),
        FieldSpec::required("mail", FieldKind::String),
        FieldSpec::required("birthdate", FieldKind::DateTime),
        FieldSpec::required("sex", FieldKind::String),
        FieldSpec::required("company", FieldKind::String),
        FieldSpec::required("job", FieldKind::String),
        FieldSpec::required("ssn", FieldKind::String),
        FieldSpec::required("residence", FieldKind::String),
        FieldSpec::required("current_location", FieldKind::Array(&FieldKind::Number)),
        FieldSpec::required("blood_group", FieldKind::String),
        FieldSpec::required("website", FieldKind::Array(&FieldKind::String)),
    ];
}

/// Changes to a profile. Members left `None` are not part of the update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<Vec<String>>,
}
