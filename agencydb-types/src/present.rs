//! Serde field helpers shared by the generated table shapes.

use serde::{Deserialize, Deserializer};

/// Deserializes a field that is optional in the payload but must carry a value of the
/// inner type when present. Combined with `#[serde(default)]`, a missing key becomes `None`
/// while an explicit `null` is handed to `T`, so it is only accepted when `T` is itself
/// nullable (`Option<_>`).
pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Deserializes a nullable column that must still be present (Row shapes).
/// Without `#[serde(default)]` a missing key is reported as a missing field.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}
