//! Inbound entity and area records.
//!
//! Discovery and enrichment produce these; the index builder replays them
//! through `add_entity` / `add_area`.

use serde::{Deserialize, Serialize};

/// Kind of name a device is known by.
///
/// Unknown tags are preserved in [`VariantType::Other`] so records written by
/// newer discovery code still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariantType {
    /// Name reported by the integration
    PrimaryName,
    /// Name the user set in the UI
    UserRenamed,
    /// User-defined alias
    Alias,
    /// Friendly name attribute
    FriendlyName,
    /// Any other tag
    Other(String),
}

impl VariantType {
    pub fn as_str(&self) -> &str {
        match self {
            VariantType::PrimaryName => "primary_name",
            VariantType::UserRenamed => "user_renamed",
            VariantType::Alias => "alias",
            VariantType::FriendlyName => "friendly_name",
            VariantType::Other(tag) => tag,
        }
    }
}

impl From<&str> for VariantType {
    fn from(tag: &str) -> Self {
        match tag {
            "primary_name" => VariantType::PrimaryName,
            "user_renamed" => VariantType::UserRenamed,
            "alias" => VariantType::Alias,
            "friendly_name" => VariantType::FriendlyName,
            other => VariantType::Other(other.to_string()),
        }
    }
}

impl From<String> for VariantType {
    fn from(tag: String) -> Self {
        VariantType::from(tag.as_str())
    }
}

impl From<VariantType> for String {
    fn from(variant_type: VariantType) -> Self {
        variant_type.as_str().to_string()
    }
}

impl std::fmt::Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device as reported by discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Canonical id, e.g. `light.office_lamp`
    pub entity_id: String,

    /// Domain, e.g. `light`
    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,

    /// Names in the order they should be indexed
    #[serde(default)]
    pub name_variants: Vec<(VariantType, String)>,
}

impl EntityRecord {
    /// Create a record with no names and no area.
    pub fn new(entity_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            domain: domain.into(),
            device_id: None,
            area_id: None,
            area_name: None,
            name_variants: Vec::new(),
        }
    }

    /// Derive the domain from the `domain.object_id` form of the id.
    pub fn from_entity_id(entity_id: impl Into<String>) -> Self {
        let entity_id = entity_id.into();
        let domain = entity_id
            .split_once('.')
            .map(|(domain, _)| domain.to_string())
            .unwrap_or_default();
        Self::new(entity_id, domain)
    }

    pub fn with_variant(mut self, variant_type: VariantType, name: impl Into<String>) -> Self {
        self.name_variants.push((variant_type, name.into()));
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_area(mut self, area_id: impl Into<String>, area_name: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self.area_name = Some(area_name.into());
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A room or zone as reported by discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub area_id: String,

    /// Display name, e.g. "Living Room"
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_area_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_area_name: Option<String>,
}

impl AreaRecord {
    pub fn new(area_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            area_id: area_id.into(),
            name: name.into(),
            aliases: Vec::new(),
            parent_area_id: None,
            parent_area_name: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Nest this area under `parent_area_id`.
    pub fn with_parent(
        mut self,
        parent_area_id: impl Into<String>,
        parent_area_name: Option<String>,
    ) -> Self {
        self.parent_area_id = Some(parent_area_id.into());
        self.parent_area_name = parent_area_name;
        self
    }
}
