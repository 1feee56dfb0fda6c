use crate::models::Listing;
use std::collections::HashSet;
use uuid::Uuid;

/// Flower dropdown selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowerFilter {
    #[default]
    All,
    Tag(String),
}

impl FlowerFilter {
    /// "all" (or an empty string) disables the predicate
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" => FlowerFilter::All,
            tag => FlowerFilter::Tag(tag.to_string()),
        }
    }
}

/// Beekeeper search state; every field is an independent predicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Case-insensitive substring of the title
    pub search: String,
    /// Case-insensitive substring of the location
    pub location: String,
    pub flower: FlowerFilter,
    pub favorites_only: bool,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing, favorites: &HashSet<Uuid>) -> bool {
        if self.favorites_only && !favorites.contains(&listing.id) {
            return false;
        }
        if !contains_folded(&listing.title, &self.search) {
            return false;
        }
        if !contains_folded(&listing.location, &self.location) {
            return false;
        }
        match &self.flower {
            FlowerFilter::All => true,
            FlowerFilter::Tag(tag) => listing.has_flower(tag),
        }
    }

    /// Listings passing every active predicate, in their original order
    pub fn apply<'a>(&self, listings: &'a [Listing], favorites: &HashSet<Uuid>) -> Vec<&'a Listing> {
        if self.favorites_only && favorites.is_empty() {
            return Vec::new();
        }
        listings
            .iter()
            .filter(|listing| self.matches(listing, favorites))
            .collect()
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationStatus;
    use chrono::Utc;

    fn listing(title: &str, location: &str, flowers: &[&str]) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            location: location.to_string(),
            flowers: flowers.iter().map(|f| f.to_string()).collect(),
            space_hectares: 1.0,
            price_per_month: 100.0,
            available_from: None,
            available_until: None,
            image_urls: vec![],
            verification_status: VerificationStatus::Verified,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing("Livadă cu meri", "Sibiu", &["Măr", "Trifoi"]),
            listing("Câmp de rapiță", "Brăila", &["Rapiță"]),
            listing("Pădure de tei", "Suceava", &["Tei", "Salcâm"]),
            listing("Grădina Lavandă", "Sibiu", &["Lavandă", "Mentă"]),
        ]
    }

    fn titles(result: &[&Listing]) -> Vec<String> {
        result.iter().map(|l| l.title.clone()).collect()
    }

    #[test]
    fn default_filter_keeps_everything_in_order() {
        let listings = sample();
        let result = ListingFilter::default().apply(&listings, &HashSet::new());
        assert_eq!(result.len(), listings.len());
        assert!(result.iter().zip(&listings).all(|(a, b)| a.id == b.id));
    }

    #[test]
    fn text_predicates_ignore_case() {
        let listings = sample();
        let filter = ListingFilter {
            search: "TEI".into(),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&listings, &HashSet::new())), ["Pădure de tei"]);

        let filter = ListingFilter {
            location: "sibiu".into(),
            ..Default::default()
        };
        assert_eq!(
            titles(&filter.apply(&listings, &HashSet::new())),
            ["Livadă cu meri", "Grădina Lavandă"]
        );
    }

    #[test]
    fn predicates_combine_with_and() {
        let listings = sample();
        let filter = ListingFilter {
            location: "Sibiu".into(),
            flower: FlowerFilter::Tag("Lavandă".into()),
            ..Default::default()
        };
        assert_eq!(titles(&filter.apply(&listings, &HashSet::new())), ["Grădina Lavandă"]);
    }

    #[test]
    fn flower_tag_is_exact_membership() {
        let listings = sample();
        let filter = ListingFilter {
            flower: FlowerFilter::parse("Tei"),
            ..Default::default()
        };
        assert_eq!(filter.apply(&listings, &HashSet::new()).len(), 1);

        let filter = ListingFilter {
            flower: FlowerFilter::parse("Te"),
            ..Default::default()
        };
        assert!(filter.apply(&listings, &HashSet::new()).is_empty());
        assert_eq!(FlowerFilter::parse("all"), FlowerFilter::All);
    }

    #[test]
    fn favorites_only_with_no_favorites_is_empty() {
        let listings = sample();
        let filter = ListingFilter {
            favorites_only: true,
            ..Default::default()
        };
        assert!(filter.apply(&listings, &HashSet::new()).is_empty());
    }

    #[test]
    fn favorites_only_keeps_members() {
        let listings = sample();
        let favorites: HashSet<Uuid> = [listings[3].id, listings[1].id].into_iter().collect();
        let filter = ListingFilter {
            favorites_only: true,
            ..Default::default()
        };
        assert_eq!(
            titles(&filter.apply(&listings, &favorites)),
            ["Câmp de rapiță", "Grădina Lavandă"]
        );
    }

    #[test]
    fn result_is_always_an_ordered_subsequence() {
        let listings = sample();
        let favorites: HashSet<Uuid> = [listings[0].id, listings[2].id].into_iter().collect();
        let searches = ["", "a", "de", "x"];
        let locations = ["", "S", "sibiu"];
        let flowers = ["all", "Tei", "Măr", "Mentă"];

        for search in searches {
            for location in locations {
                for flower in flowers {
                    for favorites_only in [false, true] {
                        let filter = ListingFilter {
                            search: search.into(),
                            location: location.into(),
                            flower: FlowerFilter::parse(flower),
                            favorites_only,
                        };
                        let result = filter.apply(&listings, &favorites);
                        let mut cursor = listings.iter();
                        for picked in &result {
                            assert!(
                                cursor.any(|l| l.id == picked.id),
                                "{filter:?} broke ordering"
                            );
                        }
                    }
                }
            }
        }
    }
}
