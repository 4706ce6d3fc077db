//! # pawtag-shared
//!
//! Domain types and pure logic shared by every Pawtag crate: pet records and
//! their validation, location samples, user profiles, the QR payload protocol
//! and the outbound contact links handed to finders.

pub mod constants;
pub mod contact;
pub mod error;
pub mod location;
pub mod payload;
pub mod pet;
pub mod profile;
pub mod types;
pub mod view;

pub use error::{PayloadError, ValidationError};
pub use location::{LocationHistory, LocationSample};
pub use pet::{PetDraft, PetRecord};
pub use profile::UserProfile;
pub use types::{PetId, QrId, UserId};
pub use view::PetInfoView;
