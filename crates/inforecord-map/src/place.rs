//! Place log payload built from a committed pin.
//!
//! The places backend stores a pin together with the weather at the time it
//! was recorded. Validation mirrors the backend's field rules so a bad
//! request is caught before it is sent.

use serde::{Deserialize, Serialize};

use inforecord_core::ValidationResult;

use crate::marker::FixedMarker;

const MAX_TITLE_CHARS: usize = 100;
const MAX_COMMENT_CHARS: usize = 500;

/// Extra details the place log records next to a pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    /// Free text; the pin keyword is used when empty
    pub comment: String,
    /// `#RRGGBB`
    pub color: String,
    pub weather: String,
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    pub place_title: String,
    pub comment: String,
    pub color: String,
    pub weather: String,
    pub temperature: f32,
    pub humidity: f32,
    pub latitude: f64,
    pub longitude: f64,
}

impl PlaceRequest {
    pub fn from_marker(marker: &FixedMarker, details: PlaceDetails) -> Self {
        let comment = if details.comment.is_empty() {
            marker.keyword().to_string()
        } else {
            details.comment
        };

        Self {
            place_title: marker.label().to_string(),
            comment,
            color: details.color,
            weather: details.weather,
            temperature: details.temperature,
            humidity: details.humidity,
            latitude: marker.position().lat(),
            longitude: marker.position().lng(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let title_chars = self.place_title.trim().chars().count();
        if title_chars == 0 {
            result.add_error("placeTitle", "Place title is required");
        } else if self.place_title.chars().count() > MAX_TITLE_CHARS {
            result.add_error(
                "placeTitle",
                format!("Place title cannot exceed {MAX_TITLE_CHARS} characters"),
            );
        }

        if self.comment.chars().count() > MAX_COMMENT_CHARS {
            result.add_error(
                "comment",
                format!("Comment cannot exceed {MAX_COMMENT_CHARS} characters"),
            );
        }

        if !is_hex_color(&self.color) {
            result.add_error("color", "Color must look like #RRGGBB");
        }

        if self.weather.trim().is_empty() {
            result.add_error("weather", "Weather is required");
        }

        if !(-50.0..=50.0).contains(&self.temperature) {
            result.add_error("temperature", "Temperature must be between -50 and 50");
        }

        if !(0.0..=100.0).contains(&self.humidity) {
            result.add_error("humidity", "Humidity must be between 0 and 100");
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            result.add_error("latitude", "Latitude must be between -90 and 90");
        }

        if !(-180.0..=180.0).contains(&self.longitude) {
            result.add_error("longitude", "Longitude must be between -180 and 180");
        }

        result
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::overlay::OverlayFields;

    fn marker(label: &str, keyword: &str) -> FixedMarker {
        FixedMarker::new(
            GeoPoint::new(37.30, 126.84).unwrap(),
            OverlayFields::new(label, keyword),
        )
    }

    fn details() -> PlaceDetails {
        PlaceDetails {
            comment: String::new(),
            color: "#FFB6C1".to_string(),
            weather: "Clear".to_string(),
            temperature: 21.5,
            humidity: 40.0,
        }
    }

    #[test]
    fn keyword_fills_empty_comment() {
        let request = PlaceRequest::from_marker(&marker("카페", "따뜻한"), details());
        assert_eq!(request.place_title, "카페");
        assert_eq!(request.comment, "따뜻한");
        assert!(request.validate().is_valid());
    }

    #[test]
    fn serializes_with_backend_field_names() {
        let request = PlaceRequest::from_marker(&marker("카페", ""), details());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["placeTitle"], "카페");
        assert_eq!(json["latitude"], 37.30);
    }

    #[test]
    fn empty_label_fails_validation() {
        let request = PlaceRequest::from_marker(&marker("", ""), details());
        let result = request.validate();
        assert!(result.errors.iter().any(|e| e.field == "placeTitle"));
    }

    #[test]
    fn title_limit_counts_characters_not_bytes() {
        let title: String = "가".repeat(100);
        let request = PlaceRequest::from_marker(&marker(&title, ""), details());
        assert!(request.validate().is_valid());

        let too_long: String = "가".repeat(101);
        let request = PlaceRequest::from_marker(&marker(&too_long, ""), details());
        assert!(!request.validate().is_valid());
    }

    #[test]
    fn weather_ranges_and_color_are_checked() {
        let bad = PlaceDetails {
            color: "pink".to_string(),
            temperature: 60.0,
            humidity: -1.0,
            ..details()
        };
        let result = PlaceRequest::from_marker(&marker("park", ""), bad).validate();
        for field in ["color", "temperature", "humidity"] {
            assert!(result.errors.iter().any(|e| e.field == field), "{field}");
        }
    }
}
