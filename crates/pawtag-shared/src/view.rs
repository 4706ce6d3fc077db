use serde::{Deserialize, Serialize};

use crate::contact::contact_link;
use crate::location::{LocationHistory, LocationSample};
use crate::pet::PetRecord;

/// What a finder sees after scanning a code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PetInfoView {
    Found {
        pet: PetRecord,
        /// Latest position of the finder, all-null when geolocation was
        /// denied or has not completed.
        user_location: LocationSample,
        location_history: LocationHistory,
        /// Pending outbound message to the owner.
        contact_link: String,
    },
    /// Missing, malformed or unknown `qr_id`.
    Invalid,
}

impl PetInfoView {
    /// Build the view for a resolved record. `user_location` is `None`
    /// until (or unless) the finder's position has been resolved.
    pub fn found(
        pet: PetRecord,
        user_location: Option<LocationSample>,
        location_history: LocationHistory,
    ) -> Self {
        let contact_link = contact_link(&pet, user_location.as_ref());
        Self::Found {
            pet,
            user_location: user_location.unwrap_or_else(LocationSample::unresolved),
            location_history,
            contact_link,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::PetDraft;

    fn rex() -> PetRecord {
        PetDraft {
            pet_name: "Rex".into(),
            owner_name: "João".into(),
            phone: "(11) 99999-9999".into(),
            ..Default::default()
        }
        .into_record()
        .unwrap()
    }

    #[test]
    fn test_denied_location_still_renders_contact() {
        let view = PetInfoView::found(rex(), None, LocationHistory::new());
        match view {
            PetInfoView::Found {
                pet,
                user_location,
                contact_link,
                ..
            } => {
                assert_eq!(pet.phone, "(11) 99999-9999");
                assert!(user_location.latitude.is_none());
                assert!(user_location.city.is_none());
                assert!(contact_link.starts_with("https://wa.me/11999999999"));
            }
            PetInfoView::Invalid => panic!("expected a resolved view"),
        }
    }

    #[test]
    fn test_invalid_serializes_with_state_tag() {
        let json = serde_json::to_value(PetInfoView::Invalid).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "invalid" }));
    }
}
