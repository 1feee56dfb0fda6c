use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Flower tags a landowner can pick from, in display order
pub const AVAILABLE_FLOWERS: &[&str] = &[
    "Salcâm",
    "Tei",
    "Rapiță",
    "Floarea-soarelui",
    "Trifoi",
    "Lavandă",
    "Mentă",
    "Coriandru",
    "Măr",
    "Păr",
    "Cireș",
    "Gutui",
    "Nuc",
    "Castan",
    "Alte flori",
];

/// Account capability class
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Beekeeper,
    Landowner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Beekeeper => "beekeeper",
            Role::Landowner => "landowner",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beekeeper" => Ok(Role::Beekeeper),
            "landowner" => Ok(Role::Landowner),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Admin approval gate controlling beekeeper visibility
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Denied,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity record owned by the auth service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// One-to-one companion of a [`User`], carrying the role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A unit of rentable land
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flowers: Vec<String>,
    pub space_hectares: f64,
    pub price_per_month: f64,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_urls: Vec<String>,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn has_flower(&self, flower: &str) -> bool {
        self.flowers.iter().any(|f| f == flower)
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }

    /// Flower badges as shown on a card: at most three, then "+N more"
    pub fn flower_badges(&self) -> Vec<String> {
        let mut badges: Vec<String> = self.flowers.iter().take(3).cloned().collect();
        if self.flowers.len() > 3 {
            badges.push(format!("+{} more", self.flowers.len() - 3));
        }
        badges
    }
}

/// Insert payload for `land_listings`
///
/// The verification status is fixed to pending at construction.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewListing {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub flowers: Vec<String>,
    pub space_hectares: f64,
    pub price_per_month: f64,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    pub image_urls: Vec<String>,
    verification_status: VerificationStatus,
}

impl NewListing {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: Uuid,
        title: String,
        description: Option<String>,
        location: String,
        flowers: Vec<String>,
        space_hectares: f64,
        price_per_month: f64,
        available_from: Option<NaiveDate>,
        available_until: Option<NaiveDate>,
        image_urls: Vec<String>,
    ) -> Self {
        Self {
            owner_id,
            title,
            description,
            location,
            flowers,
            space_hectares,
            price_per_month,
            available_from,
            available_until,
            image_urls,
            verification_status: VerificationStatus::Pending,
        }
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification_status
    }
}

/// A beekeeper's saved reference to a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Favorite {
    pub beekeeper_id: Uuid,
    pub land_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Listing title embedded in a booking row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookedLand {
    pub title: String,
}

/// Beekeeper contact embedded in a booking row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingContact {
    pub email: String,
    pub full_name: Option<String>,
}

/// Read-only booking row as shown in the admin console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub land_id: Uuid,
    pub beekeeper_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, rename = "land_listings")]
    pub land: Option<BookedLand>,
    #[serde(default, rename = "profiles")]
    pub beekeeper: Option<BookingContact>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_row_tolerates_null_arrays() {
        let row = json!({
            "id": "7d3f1c52-3f0e-4c1e-9a43-0c5c3b1e2a10",
            "owner_id": "0a5f6a0e-2b4f-4f55-8d8e-3b9c1f3b7e21",
            "title": "Livada de lângă Sibiu",
            "description": null,
            "location": "Sibiu",
            "flowers": null,
            "space_hectares": 2.5,
            "price_per_month": 300.0,
            "available_from": "2026-04-01",
            "available_until": null,
            "image_urls": null,
            "verification_status": "verified",
            "created_at": "2026-03-01T10:00:00Z"
        });

        let listing: Listing = serde_json::from_value(row).unwrap();
        assert!(listing.flowers.is_empty());
        assert!(listing.image_urls.is_empty());
        assert_eq!(listing.verification_status, VerificationStatus::Verified);
        assert_eq!(
            listing.available_from,
            NaiveDate::from_ymd_opt(2026, 4, 1)
        );
    }

    #[test]
    fn new_listing_always_serializes_pending() {
        let listing = NewListing::new(
            Uuid::new_v4(),
            "Teren".into(),
            None,
            "Cluj".into(),
            vec!["Tei".into()],
            1.0,
            100.0,
            None,
            None,
            vec![],
        );
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["verification_status"], "pending");
    }

    #[test]
    fn flower_badges_collapse_after_three() {
        let mut listing: Listing = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "owner_id": Uuid::new_v4(),
            "title": "t",
            "description": null,
            "location": "l",
            "flowers": ["Tei", "Salcâm", "Rapiță", "Trifoi", "Nuc"],
            "space_hectares": 1.0,
            "price_per_month": 1.0,
            "available_from": null,
            "available_until": null,
            "verification_status": "pending",
            "created_at": "2026-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(listing.flower_badges(), vec!["Tei", "Salcâm", "Rapiță", "+2 more"]);

        listing.flowers.truncate(2);
        assert_eq!(listing.flower_badges(), vec!["Tei", "Salcâm"]);
    }

    #[test]
    fn role_parses_from_lowercase() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }
}
