use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header carrying the per-request identifier across process boundaries.
pub const REQUEST_ID_HEADER: &str = "Request-Id";
/// Header carrying the correlation identifier shared by a chain of requests.
pub const CORRELATION_ID_HEADER: &str = "Correlation-Id";

/// Strongly typed request identifier backed by ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Use the inbound header value when present and non-empty, otherwise
    /// generate a fresh identifier.
    ///
    /// Inbound identifiers are opaque and are not required to be ULIDs, so this
    /// returns the string form rather than a `RequestId`.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> String {
        match header_value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => Self::new().to_string(),
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = ulid::Ulid::from_string(s)?;
        Ok(RequestId(id))
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<RequestId>()
            .map_err(|_| serde::de::Error::custom("invalid request id"))
    }
}
