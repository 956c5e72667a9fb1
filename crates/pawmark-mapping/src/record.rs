use serde::{Deserialize, Serialize};

/// The persisted mapping between a public short code and an internal ID.
///
/// One record exists per issued code; `short_code <-> original_id` is a
/// bijection in the store. Records are created at issuance time and never
/// mutated; deletion is an out-of-band administrative action.
///
/// `owner_id` associates the record with the entity (typically a user) the
/// code represents, but is not unique-constrained here: an owner that calls
/// issuance twice receives two codes. Callers wanting one-code-per-owner
/// must check before issuing.
///
/// Field names serialize in the camelCase form the document store indexes
/// (`shortCode`, `originalId`, `ownerId`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRecord {
    /// The 9-digit public code.
    pub short_code: String,
    /// The decimal form of the 64-bit internal ID.
    pub original_id: String,
    /// The entity this code was issued for.
    pub owner_id: String,
    /// Issuance time, milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// The indexed fields a [`MappingStore`] can be queried by.
///
/// [`MappingStore`]: crate::MappingStore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingField {
    ShortCode,
    OriginalId,
}

impl MappingField {
    /// The document field name as stored.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ShortCode => "shortCode",
            Self::OriginalId => "originalId",
        }
    }

    /// Extracts this field's value from a record.
    pub fn value_of<'r>(&self, record: &'r MappingRecord) -> &'r str {
        match self {
            Self::ShortCode => &record.short_code,
            Self::OriginalId => &record.original_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_store_field_names() {
        let record = MappingRecord {
            short_code: "123456789".into(),
            original_id: "7096320000000004096".into(),
            owner_id: "user-1".into(),
            created_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["shortCode"], "123456789");
        assert_eq!(json["originalId"], "7096320000000004096");
        assert_eq!(json["ownerId"], "user-1");
        assert_eq!(json["createdAt"], 1_700_000_000_000u64);

        let back: MappingRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn field_names_match_accessors() {
        let record = MappingRecord {
            short_code: "987654321".into(),
            original_id: "42".into(),
            owner_id: "owner".into(),
            created_at: 0,
        };
        assert_eq!(MappingField::ShortCode.as_str(), "shortCode");
        assert_eq!(MappingField::OriginalId.as_str(), "originalId");
        assert_eq!(MappingField::ShortCode.value_of(&record), "987654321");
        assert_eq!(MappingField::OriginalId.value_of(&record), "42");
    }
}
