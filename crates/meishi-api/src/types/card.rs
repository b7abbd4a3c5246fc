//! Card records and their editable fields.

use serde::{Deserialize, Serialize};

/// The nine user-editable fields of a business card. Every field is a
/// plain string on the wire; `tags` is a comma-joined list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub notes: String,
}

/// A stored card as the backend returns it: the editable fields plus the
/// attributes only the backend assigns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub image_file_id: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub raw_json: String,
    #[serde(flatten)]
    pub fields: CardFields,
}

/// A partial edit to a card. The backend replaces the full field set on
/// every update, so unset members are sent as empty strings rather than
/// omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub name: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub tags: Option<String>,
    pub notes: Option<String>,
}

impl CardPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The full field set this patch writes, with empty strings standing
    /// in for unset members.
    #[must_use]
    pub fn to_fields(&self) -> CardFields {
        CardFields {
            name: self.name.clone().unwrap_or_default(),
            company: self.company.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            website: self.website.clone().unwrap_or_default(),
            tags: self.tags.clone().unwrap_or_default(),
            notes: self.notes.clone().unwrap_or_default(),
        }
    }

    /// Overlays `other` on this patch. Members set in `other` win.
    #[must_use]
    pub fn merge(self, other: CardPatch) -> CardPatch {
        CardPatch {
            name: other.name.or(self.name),
            company: other.company.or(self.company),
            title: other.title.or(self.title),
            phone: other.phone.or(self.phone),
            email: other.email.or(self.email),
            address: other.address.or(self.address),
            website: other.website.or(self.website),
            tags: other.tags.or(self.tags),
            notes: other.notes.or(self.notes),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl From<CardFields> for CardPatch {
    fn from(fields: CardFields) -> Self {
        Self {
            name: Some(fields.name),
            company: Some(fields.company),
            title: Some(fields.title),
            phone: Some(fields.phone),
            email: Some(fields.email),
            address: Some(fields.address),
            website: Some(fields.website),
            tags: Some(fields.tags),
            notes: Some(fields.notes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_fills_unset_fields_with_empty_strings() {
        let patch = CardPatch::new().with_name("Ada").with_tags("vendor,print");
        let fields = patch.to_fields();
        assert_eq!(fields.name, "Ada");
        assert_eq!(fields.tags, "vendor,print");
        assert_eq!(fields.company, "");
        assert_eq!(fields.notes, "");
    }

    #[test]
    fn test_record_round_trips_flat_wire_shape() {
        let wire = serde_json::json!({
            "id": "card_1",
            "created_at": "2024-05-01T09:00:00Z",
            "name": "Ada Lovelace",
            "company": "Analytical Engines",
            "tags": "math"
        });
        let record: CardRecord = serde_json::from_value(wire).unwrap();
        assert_eq!(record.id, "card_1");
        assert_eq!(record.fields.name, "Ada Lovelace");
        assert_eq!(record.fields.company, "Analytical Engines");
        assert_eq!(record.fields.phone, "");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["name"], "Ada Lovelace");
        assert!(back.get("fields").is_none());
    }

    #[test]
    fn test_merge_prefers_the_overlay() {
        let stored = CardPatch::new().with_name("Old").with_company("Keep Co");
        let merged = stored.merge(CardPatch::new().with_name("New"));
        assert_eq!(merged.name.as_deref(), Some("New"));
        assert_eq!(merged.company.as_deref(), Some("Keep Co"));
        assert!(merged.phone.is_none());
    }

    #[test]
    fn test_patch_from_fields_sets_every_member() {
        let fields = CardFields {
            name: "Ada".into(),
            ..Default::default()
        };
        let patch = CardPatch::from(fields);
        assert_eq!(patch.name.as_deref(), Some("Ada"));
        assert_eq!(patch.company.as_deref(), Some(""));
    }
}
