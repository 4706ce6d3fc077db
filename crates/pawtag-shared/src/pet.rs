//! Pet records and the profile form that creates and updates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::REWARD_CURRENCY;
use crate::error::ValidationError;
use crate::types::{PetId, QrId};

/// A persisted pet profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetRecord {
    /// Internal row identifier.
    pub id: PetId,
    /// Display identifier used in the public URL. Immutable once generated.
    pub qr_id: QrId,
    pub pet_name: String,
    pub owner_name: String,
    /// Free-form phone as typed by the owner.
    pub phone: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    /// Non-negative reward offered to the finder.
    pub reward: f64,
    /// Public URL of the uploaded photo, if any.
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PetRecord {
    /// Check the invariants every stored record must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("pet_name", &self.pet_name)?;
        require("owner_name", &self.owner_name)?;
        require("phone", &self.phone)?;
        validate_reward(self.reward)
    }

    /// Replace every form field with the draft's values. `id`, `qr_id`,
    /// `photo_url` and `created_at` are left untouched.
    pub fn apply(&mut self, draft: PetDraft) -> Result<(), ValidationError> {
        let draft = draft.normalized()?;
        self.pet_name = draft.pet_name;
        self.owner_name = draft.owner_name;
        self.phone = draft.phone;
        self.address = draft.address;
        self.notes = draft.notes;
        self.reward = draft.reward;
        Ok(())
    }

    /// Phone reduced to its digits, as used in contact links.
    pub fn phone_digits(&self) -> String {
        digits_only(&self.phone)
    }

    /// Case-insensitive match on pet or owner name, plain substring match on
    /// the phone. An empty filter matches everything.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let filter = filter.trim();
        if filter.is_empty() {
            return true;
        }
        let needle = filter.to_lowercase();
        self.pet_name.to_lowercase().contains(&needle)
            || self.owner_name.to_lowercase().contains(&needle)
            || self.phone.contains(filter)
    }

    /// `Some("R$ 50.00")` when a reward is offered.
    pub fn reward_label(&self) -> Option<String> {
        (self.reward > 0.0).then(|| format!("{} {:.2}", REWARD_CURRENCY, self.reward))
    }
}

/// Input of the profile form, shared by the owner flow and the admin
/// console. Accepts both `snake_case` and `camelCase` field names.
///
/// There is no photo field: a photo is only ever set by uploading it, so a
/// record can never point at a blob it does not own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PetDraft {
    #[serde(alias = "petName")]
    pub pet_name: String,
    #[serde(alias = "ownerName")]
    pub owner_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reward: f64,
}

impl PetDraft {
    /// Trim text fields, drop blank optionals and check required fields.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let draft = Self {
            pet_name: self.pet_name.trim().to_string(),
            owner_name: self.owner_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: non_blank(self.address),
            notes: non_blank(self.notes),
            reward: self.reward,
        };

        require("pet_name", &draft.pet_name)?;
        require("owner_name", &draft.owner_name)?;
        require("phone", &draft.phone)?;
        if digits_only(&draft.phone).is_empty() {
            return Err(ValidationError::PhoneWithoutDigits);
        }
        validate_reward(draft.reward)?;

        Ok(draft)
    }

    /// Validate the draft and turn it into a brand new record with a fresh
    /// internal id and display identifier.
    pub fn into_record(self) -> Result<PetRecord, ValidationError> {
        let draft = self.normalized()?;
        Ok(PetRecord {
            id: PetId::new(),
            qr_id: QrId::generate(),
            pet_name: draft.pet_name,
            owner_name: draft.owner_name,
            phone: draft.phone,
            address: draft.address,
            notes: draft.notes,
            reward: draft.reward,
            photo_url: None,
            created_at: Utc::now(),
        })
    }
}

/// Strip everything but ASCII digits: `"(11) 99999-9999"` → `"11999999999"`.
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn validate_reward(reward: f64) -> Result<(), ValidationError> {
    if !reward.is_finite() || reward < 0.0 {
        return Err(ValidationError::InvalidReward(reward));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rex() -> PetDraft {
        PetDraft {
            pet_name: "Rex".into(),
            owner_name: "João".into(),
            phone: "(11) 99999-9999".into(),
            reward: 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_into_record() {
        let record = rex().into_record().unwrap();
        assert_eq!(record.pet_name, "Rex");
        assert_eq!(record.phone, "(11) 99999-9999");
        assert_eq!(record.phone_digits(), "11999999999");
        assert_eq!(record.reward, 50.0);
        assert!(record.address.is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut draft = rex();
        draft.owner_name = "   ".into();
        assert_eq!(
            draft.normalized().unwrap_err(),
            ValidationError::MissingField("owner_name")
        );

        let mut draft = rex();
        draft.phone = "call me".into();
        assert_eq!(
            draft.normalized().unwrap_err(),
            ValidationError::PhoneWithoutDigits
        );
    }

    #[test]
    fn test_negative_reward_rejected() {
        let mut draft = rex();
        draft.reward = -1.0;
        assert!(draft.normalized().is_err());

        let mut draft = rex();
        draft.reward = f64::NAN;
        assert!(draft.normalized().is_err());
    }

    #[test]
    fn test_blank_optionals_become_none() {
        let mut draft = rex();
        draft.address = Some("  ".into());
        draft.notes = Some(" friendly ".into());
        let draft = draft.normalized().unwrap();
        assert_eq!(draft.address, None);
        assert_eq!(draft.notes.as_deref(), Some("friendly"));
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut record = rex().into_record().unwrap();
        let qr_id = record.qr_id.clone();
        let id = record.id;

        let mut update = rex();
        update.pet_name = "Rex II".into();
        update.reward = 0.0;
        record.apply(update).unwrap();

        assert_eq!(record.qr_id, qr_id);
        assert_eq!(record.id, id);
        assert_eq!(record.pet_name, "Rex II");
        assert_eq!(record.reward_label(), None);
    }

    #[test]
    fn test_apply_keeps_uploaded_photo() {
        let mut record = rex().into_record().unwrap();
        record.photo_url = Some("https://pawtag.test/blob/1".into());

        let mut update = rex();
        update.notes = Some("Castrado".into());
        record.apply(update).unwrap();

        assert_eq!(record.photo_url.as_deref(), Some("https://pawtag.test/blob/1"));
        assert_eq!(record.notes.as_deref(), Some("Castrado"));
    }

    #[test]
    fn test_form_cannot_set_photo() {
        let draft: PetDraft = serde_json::from_str(
            r#"{"petName":"Rex","ownerName":"João","phone":"1","photoUrl":"https://pawtag.test/blob/1"}"#,
        )
        .unwrap();
        assert_eq!(draft.into_record().unwrap().photo_url, None);
    }

    #[test]
    fn test_camel_case_form_accepted() {
        let draft: PetDraft = serde_json::from_str(
            r#"{"petName":"Rex","ownerName":"João","phone":"(11) 99999-9999","reward":50}"#,
        )
        .unwrap();
        assert_eq!(draft, rex());
    }

    #[test]
    fn test_matches_filter() {
        let record = rex().into_record().unwrap();
        assert!(record.matches_filter(""));
        assert!(record.matches_filter("rEx"));
        assert!(record.matches_filter("joão"));
        assert!(record.matches_filter("99999"));
        assert!(!record.matches_filter("Bidu"));
    }

    #[test]
    fn test_reward_label() {
        let record = rex().into_record().unwrap();
        assert_eq!(record.reward_label().as_deref(), Some("R$ 50.00"));
    }
}
