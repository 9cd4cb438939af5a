//! Zone data model
//!
//! A fetch cycle produces exactly one [`ZonePair`]. The pair is flattened into a
//! [`StateSnapshot`] for change detection and persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque upstream zone identifier
///
/// Upstream lists carry numbers or strings; both normalize to the same id,
/// so `5` and `"5"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u32> for ZoneId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ZoneId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawZoneId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawZoneId::deserialize(deserializer)? {
            RawZoneId::Text(s) => ZoneId(s),
            RawZoneId::Number(n) => ZoneId(number_key(&n)),
        })
    }
}

/// Integral floats (`5.0`) use the same key as the integer they hold
fn number_key(n: &serde_json::Number) -> String {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.fract() == 0.0
        && f.abs() < 1e15
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}

/// Which of the two announced zones a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneRole {
    Current,
    Next,
}

impl ZoneRole {
    /// Embed title used in notifications
    pub fn title(&self) -> &'static str {
        match self {
            ZoneRole::Current => "Current Terror Zone",
            ZoneRole::Next => "Next Terror Zone",
        }
    }

    /// Embed accent color (green for current, red for next)
    pub fn color(&self) -> u32 {
        match self {
            ZoneRole::Current => 0x00FF00,
            ZoneRole::Next => 0xFF0000,
        }
    }
}

/// One terror zone announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Human-readable zone label
    pub name: String,
    /// Illustrative image, empty when the directory has none
    pub image_url: String,
    /// Current or next
    pub role: ZoneRole,
    /// When this record becomes (or became) valid
    pub effective_at: DateTime<Utc>,
}

impl ZoneRecord {
    pub fn new(
        name: impl Into<String>,
        image_url: impl Into<String>,
        role: ZoneRole,
        effective_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            role,
            effective_at,
        }
    }
}

/// The result of one successful fetch: always both records, never one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonePair {
    pub current: ZoneRecord,
    pub next: ZoneRecord,
}

impl ZonePair {
    pub fn new(current: ZoneRecord, next: ZoneRecord) -> Self {
        Self { current, next }
    }

    /// Flatten into the snapshot used for change detection
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            next: self.next.clone(),
            current: self.current.clone(),
        }
    }
}

/// Unit of change detection and persistence
///
/// Holds the `(next, current)` records. Two snapshots are equal iff all eight
/// primitive fields are equal. On disk it is a flat JSON array:
///
/// ```json
/// ["Jail", "img9", "Next", "2026-01-01T11:00:00Z",
///  "Oasis", "img5", "Current", "2026-01-01T10:00:00Z"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotRow", into = "SnapshotRow")]
pub struct StateSnapshot {
    pub next: ZoneRecord,
    pub current: ZoneRecord,
}

impl StateSnapshot {
    pub fn into_pair(self) -> ZonePair {
        ZonePair {
            current: self.current,
            next: self.next,
        }
    }
}

impl From<&ZonePair> for StateSnapshot {
    fn from(pair: &ZonePair) -> Self {
        pair.snapshot()
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotRow(
    String,
    String,
    ZoneRole,
    DateTime<Utc>,
    String,
    String,
    ZoneRole,
    DateTime<Utc>,
);

impl From<SnapshotRow> for StateSnapshot {
    fn from(row: SnapshotRow) -> Self {
        let SnapshotRow(next_name, next_image, next_role, next_at, cur_name, cur_image, cur_role, cur_at) =
            row;
        Self {
            next: ZoneRecord::new(next_name, next_image, next_role, next_at),
            current: ZoneRecord::new(cur_name, cur_image, cur_role, cur_at),
        }
    }
}

impl From<StateSnapshot> for SnapshotRow {
    fn from(s: StateSnapshot) -> Self {
        SnapshotRow(
            s.next.name,
            s.next.image_url,
            s.next.role,
            s.next.effective_at,
            s.current.name,
            s.current.image_url,
            s.current.role,
            s.current.effective_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pair() -> ZonePair {
        let ten = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let eleven = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
        ZonePair::new(
            ZoneRecord::new("Oasis", "img5", ZoneRole::Current, ten),
            ZoneRecord::new("Jail", "img9", ZoneRole::Next, eleven),
        )
    }

    #[test]
    fn test_zone_id_accepts_numbers_and_strings() {
        let ids: Vec<ZoneId> = serde_json::from_str(r#"[5, "5", "abc"]"#).unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2].as_str(), "abc");
    }

    #[test]
    fn test_zone_id_integral_float_matches_integer() {
        let ids: Vec<ZoneId> = serde_json::from_str(r#"[5.0, -3.0, 5.5]"#).unwrap();
        assert_eq!(ids[0], ZoneId::from(5));
        assert_eq!(ids[1].as_str(), "-3");
        assert_eq!(ids[2].as_str(), "5.5");
    }

    #[test]
    fn test_snapshot_is_flat_array_in_next_current_order() {
        let value = serde_json::to_value(pair().snapshot()).unwrap();
        let fields = value.as_array().expect("snapshot serializes as array");

        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "Jail");
        assert_eq!(fields[2], "Next");
        assert_eq!(fields[4], "Oasis");
        assert_eq!(fields[6], "Current");
    }

    #[test]
    fn test_snapshot_equality_is_field_by_field() {
        let a = pair().snapshot();
        let mut b = a.clone();
        assert_eq!(a, b);

        b.current.image_url = "other".to_string();
        assert_ne!(a, b);

        let mut c = a.clone();
        c.next.effective_at = c.next.effective_at + chrono::TimeDelta::minutes(1);
        assert_ne!(a, c);
    }

    #[test]
    fn test_role_presentation() {
        assert_eq!(ZoneRole::Current.title(), "Current Terror Zone");
        assert_eq!(ZoneRole::Next.title(), "Next Terror Zone");
        assert_eq!(ZoneRole::Current.color(), 0x00FF00);
        assert_eq!(ZoneRole::Next.color(), 0xFF0000);
    }
}
