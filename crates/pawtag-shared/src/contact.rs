//! Outbound contact links. Nothing here talks to a messaging API: the
//! finder's browser simply opens the constructed URL.

use url::form_urlencoded;

use crate::constants::{MAPS_BASE_URL, WHATSAPP_BASE_URL};
use crate::location::LocationSample;
use crate::pet::PetRecord;

/// Pre-filled message sent by a finder, naming the pet and, when known,
/// the place it was found.
pub fn finder_message(pet_name: &str, location: Option<&LocationSample>) -> String {
    match location.and_then(LocationSample::place_label) {
        Some(place) => format!("Olá! Encontrei seu pet {pet_name} na região de {place}!"),
        None => format!("Olá! Encontrei seu pet {pet_name}!"),
    }
}

/// `https://wa.me/<digits>?text=<message>`
pub fn whatsapp_link(phone_digits: &str, message: &str) -> String {
    format!(
        "{}/{}?text={}",
        WHATSAPP_BASE_URL,
        phone_digits,
        percent_encode(message)
    )
}

/// Contact link for a finder of `pet`, optionally mentioning where it was
/// found.
pub fn contact_link(pet: &PetRecord, location: Option<&LocationSample>) -> String {
    whatsapp_link(&pet.phone_digits(), &finder_message(&pet.pet_name, location))
}

pub fn map_link(latitude: f64, longitude: f64) -> String {
    format!("{MAPS_BASE_URL}?q={latitude},{longitude}")
}

// form_urlencoded turns spaces into '+', which wa.me shows literally.
fn percent_encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
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
            reward: 50.0,
            ..Default::default()
        }
        .into_record()
        .unwrap()
    }

    #[test]
    fn test_contact_link_uses_digits_only_phone() {
        let link = contact_link(&rex(), None);
        assert!(link.starts_with("https://wa.me/11999999999?text="));
        assert_eq!(
            link,
            "https://wa.me/11999999999?text=Ol%C3%A1%21%20Encontrei%20seu%20pet%20Rex%21"
        );
    }

    #[test]
    fn test_message_mentions_place_when_resolved() {
        let here = LocationSample::at(-22.9, -43.2)
            .with_place(Some("Rio de Janeiro".into()), Some("Brasil".into()));
        assert_eq!(
            finder_message("Rex", Some(&here)),
            "Olá! Encontrei seu pet Rex na região de Rio de Janeiro, Brasil!"
        );

        let unresolved = LocationSample::at(-22.9, -43.2);
        assert_eq!(
            finder_message("Rex", Some(&unresolved)),
            "Olá! Encontrei seu pet Rex!"
        );
    }

    #[test]
    fn test_plus_is_not_left_in_message() {
        let link = whatsapp_link("1", "a b+c");
        assert_eq!(link, "https://wa.me/1?text=a%20b%2Bc");
    }
}
