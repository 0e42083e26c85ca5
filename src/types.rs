use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a group, assigned by the contacts gateway and stable across syncs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

/// Identifier of a contact, assigned by the contacts gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(GroupId);
string_id!(PersonId);

// =============================================================================
// Palette
// =============================================================================

/// Named colors from the app's asset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Color {
    Carnation,
    DarkLimeGreen,
    LightGrassGreen,
    Liliac,
    Peach,
    SeafoamBlue,
    SkyBlue,
    Slate,
    SunflowerYellow,
}

impl Color {
    /// Colors a group may be tagged with. Order is part of the fallback contract.
    pub const GROUP_COLORS: [Color; 7] = [
        Color::Carnation,
        Color::DarkLimeGreen,
        Color::Liliac,
        Color::Peach,
        Color::SeafoamBlue,
        Color::SkyBlue,
        Color::SunflowerYellow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Color::Carnation => "carnation",
            Color::DarkLimeGreen => "darkLimeGreen",
            Color::LightGrassGreen => "lightGrassGreen",
            Color::Liliac => "liliac",
            Color::Peach => "peach",
            Color::SeafoamBlue => "seafoamBlue",
            Color::SkyBlue => "skyBlue",
            Color::Slate => "slate",
            Color::SunflowerYellow => "sunflowerYellow",
        }
    }

    /// Deterministic palette pick for an identifier with no persisted color.
    ///
    /// Uses 64-bit FNV-1a so the result is identical on every platform and build.
    pub fn fallback_for(identifier: &str) -> Color {
        let index = fnv1a_64(identifier.as_bytes()) % Self::GROUP_COLORS.len() as u64;
        Self::GROUP_COLORS[index as usize]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

// =============================================================================
// Model
// =============================================================================

/// Locally owned attributes of a group. The gateway knows nothing about these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMeta {
    pub color: Color,
}

impl GroupMeta {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    pub fn fallback_for(identifier: &GroupId) -> Self {
        Self::new(Color::fallback_for(identifier.as_str()))
    }
}

/// A contact as held in memory. Group membership is derived on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub identifier: PersonId,
    pub name: String,
    pub image: Option<Vec<u8>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub group_ids: BTreeSet<GroupId>,
}

impl Person {
    pub fn from_record(record: PersonRecord) -> Self {
        Self {
            identifier: record.identifier,
            name: record.name,
            image: record.thumbnail,
            email: record.email,
            phone: record.phone,
            group_ids: BTreeSet::new(),
        }
    }
}

/// A group as held in memory: the gateway's name plus local metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub identifier: GroupId,
    pub name: String,
    pub meta: GroupMeta,
    pub member_ids: BTreeSet<PersonId>,
}

impl Group {
    pub fn from_record(record: GroupRecord, meta: GroupMeta) -> Self {
        Self {
            identifier: record.identifier,
            name: record.name,
            meta,
            member_ids: BTreeSet::new(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

// =============================================================================
// Gateway records
// =============================================================================

/// A group as reported by the contacts gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub identifier: GroupId,
    pub name: String,
}

/// A contact as reported by the contacts gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub identifier: PersonId,
    pub name: String,
    pub thumbnail: Option<Vec<u8>>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PersonRecord {
    pub fn new(identifier: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            thumbnail: None,
            email: None,
            phone: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Contacts permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Restricted,
    Denied,
}

/// Outcome of an access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
    Granted,
    Failed(String),
}

/// How to reach the members of a group in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Text,
    Email,
}

/// Row for the group list: display order, name, color and member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub color: Color,
    pub member_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_serializes_as_catalog_name() {
        let json = serde_json::to_string(&GroupMeta::new(Color::DarkLimeGreen)).unwrap();
        assert_eq!(json, r#"{"color":"darkLimeGreen"}"#);
        let meta: GroupMeta = serde_json::from_str(r#"{"color":"sunflowerYellow"}"#).unwrap();
        assert_eq!(meta.color, Color::SunflowerYellow);
    }

    #[test]
    fn test_unknown_color_is_rejected() {
        let result: Result<GroupMeta, _> = serde_json::from_str(r#"{"color":"mauve"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_fallback_color_is_stable_and_in_palette() {
        let first = Color::fallback_for("ABC-123:ABGroup");
        let second = Color::fallback_for("ABC-123:ABGroup");
        assert_eq!(first, second);
        assert!(Color::GROUP_COLORS.contains(&first));
        assert!(!Color::GROUP_COLORS.contains(&Color::Slate));
    }

    #[test]
    fn test_fallback_spreads_across_palette() {
        let distinct: std::collections::HashSet<Color> = (0..200)
            .map(|i| Color::fallback_for(&format!("group-{i}")))
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_ids_display_and_borrow() {
        let id = GroupId::from("g-7");
        assert_eq!(id.to_string(), "g-7");
        let set: std::collections::HashSet<GroupId> = [id.clone()].into_iter().collect();
        assert!(set.contains("g-7"));
    }
}
