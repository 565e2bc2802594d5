//! Open and closed enums
//!
//! An open enum accepts wire values outside its known member set. Generated
//! open enums implement [`ExpandableEnum`] and route serde through
//! [`serialize`] and [`deserialize`]. Closed enums over numbers route
//! deserialization through [`deserialize_closed`], which rejects non-members.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An enum that tolerates unknown wire values
pub trait ExpandableEnum: Sized + Clone + PartialEq {
    /// Build from a wire value; unknown values are preserved, never rejected
    fn from_value(value: &str) -> Self;

    /// The wire value
    fn value(&self) -> &str;

    /// Known members
    fn known_values() -> Vec<Self>;

    /// Whether the value is one of the known members
    fn is_known(&self) -> bool { Self::known_values().contains(self) }
}

/// Serialize an open enum as its wire string
pub fn serialize<E: ExpandableEnum, S: Serializer>(value: &E, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.value())
}

/// Deserialize an open enum from any wire string
pub fn deserialize<'de, E: ExpandableEnum, D: Deserializer<'de>>(deserializer: D) -> Result<E, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(E::from_value(&raw))
}

/// Deserialize a closed enum from its scalar wire value.
///
/// `lookup` maps a wire value to a known member; any other value is an error.
pub fn deserialize_closed<'de, V, T, D>(
    deserializer: D,
    type_name: &str,
    lookup: impl FnOnce(V) -> Option<T>,
) -> Result<T, D::Error>
where
    V: Deserialize<'de> + fmt::Display + Copy,
    D: Deserializer<'de>,
{
    let raw = V::deserialize(deserializer)?;
    lookup(raw).ok_or_else(|| serde::de::Error::custom(format!("`{}` is not a member of `{}`", raw, type_name)))
}

/// Open string value with no predeclared members
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpandableString(String);

impl ExpandableString {
    /// Wrap a wire value
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }

    /// The wire value
    pub fn as_str(&self) -> &str { &self.0 }
}

impl ExpandableEnum for ExpandableString {
    fn from_value(value: &str) -> Self { Self(value.to_string()) }

    fn value(&self) -> &str { &self.0 }

    fn known_values() -> Vec<Self> { Vec::new() }
}

impl fmt::Display for ExpandableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
