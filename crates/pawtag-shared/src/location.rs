use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::map_link;

/// One position reported by a finder. Every field but the timestamp stays
/// `None` until geolocation and reverse geocoding succeed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationSample {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// The placeholder shown while (or instead of) resolving a position.
    pub fn unresolved() -> Self {
        Self {
            latitude: None,
            longitude: None,
            city: None,
            country: None,
            timestamp: Utc::now(),
        }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::unresolved()
        }
    }

    pub fn with_place(mut self, city: Option<String>, country: Option<String>) -> Self {
        self.city = city;
        self.country = country;
        self
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// `"City, Country"` once the city is known.
    pub fn place_label(&self) -> Option<String> {
        let city = self.city.as_deref()?;
        Some(match self.country.as_deref() {
            Some(country) => format!("{city}, {country}"),
            None => city.to_string(),
        })
    }

    pub fn map_link(&self) -> Option<String> {
        self.coordinates().map(|(lat, lon)| map_link(lat, lon))
    }
}

/// Ordered (oldest first) list of samples for one pet. Append-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationHistory {
    pub locations: Vec<LocationSample>,
}

impl LocationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: LocationSample) {
        self.locations.push(sample);
    }

    pub fn latest(&self) -> Option<&LocationSample> {
        self.locations.last()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl From<Vec<LocationSample>> for LocationHistory {
    fn from(locations: Vec<LocationSample>) -> Self {
        Self { locations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_is_all_null() {
        let sample = LocationSample::unresolved();
        assert!(sample.latitude.is_none());
        assert!(sample.longitude.is_none());
        assert!(sample.city.is_none());
        assert!(sample.country.is_none());
        assert!(sample.place_label().is_none());
        assert!(sample.map_link().is_none());
    }

    #[test]
    fn test_place_label() {
        let sample = LocationSample::at(-23.55, -46.63)
            .with_place(Some("São Paulo".into()), Some("Brasil".into()));
        assert_eq!(sample.place_label().as_deref(), Some("São Paulo, Brasil"));
        assert_eq!(
            sample.map_link().as_deref(),
            Some("https://www.google.com/maps?q=-23.55,-46.63")
        );
    }

    #[test]
    fn test_history_append_order() {
        let mut history = LocationHistory::new();
        history.push(LocationSample::at(1.0, 1.0));
        history.push(LocationSample::at(2.0, 2.0));
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().latitude, Some(2.0));
    }
}
