//! Resource identity policy.
//!
//! A resource's durable identifier is assigned exactly once, at create
//! time: an explicitly supplied name is used verbatim, otherwise an id is
//! synthesized from the resource's symbolic name plus a random hex suffix,
//! truncated to the target API's identifier-length limit.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Wire key marking an object as a reference to another resource.
pub const REF_KEY: &str = "@ref";

/// Opaque, provider-assigned identifier of a live resource instance.
///
/// Serializes as a plain string. Deserializes from either a plain string
/// or the `{"@ref": "<id>"}` wire encoding the planner emits for
/// inter-resource references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = ResourceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a resource id string or a {{\"{REF_KEY}\": id}} object")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ResourceId, E> {
                Ok(ResourceId::new(v))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ResourceId, A::Error> {
                let mut id = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == REF_KEY {
                        id = Some(map.next_value::<String>()?);
                    } else {
                        return Err(de::Error::unknown_field(&key, &[REF_KEY]));
                    }
                }
                id.map(ResourceId::new)
                    .ok_or_else(|| de::Error::missing_field(REF_KEY))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Minimum random suffix length preserved when the prefix crowds the id.
/// 8 hex chars keep collisions negligible at any realistic resource count.
const MIN_RANDOM_SUFFIX: usize = 8;

/// Synthesizes a collision-resistant id: `prefix` followed by a random hex
/// suffix. The whole id always fits within `max_len`; an overlong prefix
/// is truncated first so the suffix never drops below
/// [`MIN_RANDOM_SUFFIX`] characters.
pub fn new_unique_hex_id(prefix: &str, max_len: usize) -> ResourceId {
    let suffix = Uuid::new_v4().simple().to_string();
    let prefix = truncate_str(prefix, max_len.saturating_sub(MIN_RANDOM_SUFFIX));
    let budget = max_len.saturating_sub(prefix.len()).min(suffix.len());
    ResourceId::new(format!("{prefix}{}", &suffix[..budget]))
}

/// Truncates to at most `max` bytes without splitting a character.
fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Applies the identity policy at create time: an explicit name wins,
/// otherwise the id is derived from the symbolic name. Never re-derived
/// after creation.
pub fn resolve_id(explicit: Option<&str>, symbolic: &str, max_len: usize) -> ResourceId {
    match explicit {
        Some(name) => ResourceId::new(name),
        None => new_unique_hex_id(&format!("{symbolic}-"), max_len),
    }
}
