//! Vehicle listing model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::image::{self, ImageRef};
use super::reference::{deserialize_loose_string, null_as_default, EntityId, Identified, Reference};
use super::{Brand, Importer};

/// Body style of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CarType {
    Sedan,
    Suv,
    Pickup,
    Berlin,
    Compact,
    Coupe,
    Cabriolet,
    Monospace,
}

impl CarType {
    pub const ALL: [CarType; 8] = [
        CarType::Sedan,
        CarType::Suv,
        CarType::Pickup,
        CarType::Berlin,
        CarType::Compact,
        CarType::Coupe,
        CarType::Cabriolet,
        CarType::Monospace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Sedan => "SEDAN",
            CarType::Suv => "SUV",
            CarType::Pickup => "PICKUP",
            CarType::Berlin => "BERLIN",
            CarType::Compact => "COMPACT",
            CarType::Coupe => "COUPE",
            CarType::Cabriolet => "CABRIOLET",
            CarType::Monospace => "MONOSPACE",
        }
    }
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CarType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| anyhow::anyhow!("Invalid car type: {}", s))
    }
}

impl<'de> Deserialize<'de> for CarType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Vehicle listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(rename = "type")]
    pub car_type: CarType,
    /// Decimal price exactly as the backend sent it
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub price: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "image::deserialize_list")]
    pub photos: Vec<ImageRef>,
    #[serde(default)]
    pub brand: Option<Reference<Brand>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brands: Vec<Reference<Brand>>,
    #[serde(default)]
    pub importer: Option<Reference<Importer>>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Car {
    fn entity_id(&self) -> &EntityId {
        &self.id
    }
}

impl Car {
    /// Ids of every brand this car is listed under, single or many
    pub fn brand_ids(&self) -> Vec<&EntityId> {
        let mut ids: Vec<&EntityId> = self.brand.iter().map(|b| b.id()).collect();
        for brand in &self.brands {
            if !ids.contains(&brand.id()) {
                ids.push(brand.id());
            }
        }
        ids
    }

    pub fn has_brand(&self, brand_id: &str) -> bool {
        self.brand_ids().iter().any(|id| *id == brand_id)
    }

    pub fn importer_id(&self) -> Option<&EntityId> {
        self.importer.as_ref().map(|i| i.id())
    }

    pub fn cover(&self) -> Option<&ImageRef> {
        self.photos.first()
    }

    /// Case-insensitive match on model and description
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.model.to_lowercase().contains(&query) || self.description.to_lowercase().contains(&query)
    }
}

/// Filter for the public vehicle listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarFilter {
    #[serde(default, rename = "type")]
    pub car_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        if let Some(kind) = self.car_type.as_deref().filter(|s| !s.is_empty()) {
            match kind.parse::<CarType>() {
                Ok(kind) if kind == car.car_type => {}
                _ => return false,
            }
        }
        if let Some(brand) = self.brand.as_deref().filter(|s| !s.is_empty()) {
            if !car.has_brand(brand) {
                return false;
            }
        }
        match self.q.as_deref() {
            Some(q) => car.matches_text(q),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Car {
        serde_json::from_value(serde_json::json!({
            "_id": 7,
            "model": "Tucson",
            "type": "suv",
            "price": 32000,
            "description": "Family SUV with panoramic roof",
            "photos": ["uploads\\cars\\t1.jpg", ""],
            "brand": {"id": "b1", "name": "Hyundai", "logo": "hyundai.png"},
            "brands": ["b1", "b2"],
            "importer": "i9",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_loose_backend_shape() {
        let car = sample();
        assert_eq!(car.id.as_str(), "7");
        assert_eq!(car.car_type, CarType::Suv);
        assert_eq!(car.price, "32000");
        assert_eq!(car.photos.len(), 1);
        assert_eq!(car.cover().unwrap().path(), "/uploads/cars/t1.jpg");
        assert!(car.created_at.is_some());
    }

    #[test]
    fn test_null_fields_decode_as_empty() {
        let car: Car = serde_json::from_value(serde_json::json!({
            "_id": "c1",
            "model": null,
            "type": "SEDAN",
            "price": null,
            "description": null,
            "photos": null,
            "brands": null
        }))
        .unwrap();
        assert_eq!(car.model, "");
        assert_eq!(car.description, "");
        assert!(car.photos.is_empty());
        assert!(car.brand_ids().is_empty());
    }

    #[test]
    fn test_brand_ids_are_deduplicated() {
        let car = sample();
        let ids: Vec<&str> = car.brand_ids().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert!(car.has_brand("b2"));
        assert!(!car.has_brand("b3"));
        assert_eq!(car.importer_id().unwrap().as_str(), "i9");
    }

    #[test]
    fn test_car_type_parse() {
        assert_eq!("Cabriolet".parse::<CarType>().unwrap(), CarType::Cabriolet);
        assert!("TRUCK".parse::<CarType>().is_err());
        assert_eq!(serde_json::to_value(CarType::Monospace).unwrap(), "MONOSPACE");
    }

    #[test]
    fn test_filter() {
        let car = sample();
        assert!(CarFilter::default().matches(&car));
        let by_type = CarFilter { car_type: Some("SUV".into()), ..Default::default() };
        assert!(by_type.matches(&car));
        let wrong_type = CarFilter { car_type: Some("COUPE".into()), ..Default::default() };
        assert!(!wrong_type.matches(&car));
        let by_text = CarFilter { q: Some("panoramic".into()), ..Default::default() };
        assert!(by_text.matches(&car));
        let by_brand = CarFilter { brand: Some("b3".into()), ..Default::default() };
        assert!(!by_brand.matches(&car));
    }
}
