//! Restaurant data: the static JSON document, fetched once per session.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::consts::FILTER_ALL;
use crate::worker::{Fetcher, Request};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Request failed. Returned status of {0}")]
    RequestFailed(u16),
    #[error("No restaurant id in URL")]
    NoRestaurantId,
    #[error("No restaurant with id {0} found.")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Review {
    pub name: String,
    pub date: String,
    pub rating: u8,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Restaurant {
    pub id: u32,
    pub name: String,
    pub neighborhood: String,
    #[serde(default)]
    pub photograph: Option<String>,
    pub address: String,
    pub latlng: LatLng,
    pub cuisine_type: String,
    #[serde(default)]
    pub operating_hours: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub reviews: Option<Vec<Review>>,
}

#[derive(Debug, Deserialize)]
struct RestaurantFile {
    restaurants: Vec<Restaurant>,
}

/// Page URL for a restaurant's details.
pub fn url_for_restaurant(restaurant: &Restaurant) -> String {
    format!("/restaurant/?id={}", restaurant.id)
}

/// Image URL for a restaurant, if it has a photograph.
pub fn image_url_for_restaurant(restaurant: &Restaurant) -> Option<String> {
    restaurant
        .photograph
        .as_ref()
        .map(|photo| format!("/img/{photo}"))
}

/// The `id` query parameter of a page URL.
pub fn restaurant_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
}

/// Keep the first occurrence of each value.
fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

/// Memoized access to the restaurant list. The document is fetched at most
/// once; concurrent callers share the in-flight request.
pub struct RestaurantDb {
    fetcher: Arc<dyn Fetcher>,
    url: Url,
    restaurants: OnceCell<Arc<Vec<Restaurant>>>,
}

impl RestaurantDb {
    pub fn new(fetcher: Arc<dyn Fetcher>, url: Url) -> Self {
        Self {
            fetcher,
            url,
            restaurants: OnceCell::new(),
        }
    }

    /// All restaurants. A failed fetch is not memoized; the next call retries.
    pub async fn all(&self) -> Result<Arc<Vec<Restaurant>>> {
        let restaurants = self
            .restaurants
            .get_or_try_init(|| async {
                debug!(url = %self.url, "fetching restaurant data");
                let response = self.fetcher.fetch(&Request::get(self.url.clone())).await?;
                if response.status != 200 {
                    return Err(DataError::RequestFailed(response.status).into());
                }
                let file: RestaurantFile = response.json()?;
                Ok::<_, anyhow::Error>(Arc::new(file.restaurants))
            })
            .await?;
        Ok(Arc::clone(restaurants))
    }

    /// Look up a restaurant by the string id taken from a URL.
    pub async fn by_id(&self, id: &str) -> Result<Restaurant> {
        let restaurants = self.all().await?;
        let wanted = id.trim().parse::<u32>().ok();
        restaurants
            .iter()
            .find(|r| Some(r.id) == wanted)
            .cloned()
            .ok_or_else(|| DataError::NotFound(id.to_string()).into())
    }

    pub async fn by_cuisine(&self, cuisine: &str) -> Result<Vec<Restaurant>> {
        self.by_cuisine_and_neighborhood(cuisine, FILTER_ALL).await
    }

    pub async fn by_neighborhood(&self, neighborhood: &str) -> Result<Vec<Restaurant>> {
        self.by_cuisine_and_neighborhood(FILTER_ALL, neighborhood)
            .await
    }

    /// Filter by both fields; `"all"` disables either filter.
    pub async fn by_cuisine_and_neighborhood(
        &self,
        cuisine: &str,
        neighborhood: &str,
    ) -> Result<Vec<Restaurant>> {
        let restaurants = self.all().await?;
        Ok(restaurants
            .iter()
            .filter(|r| cuisine == FILTER_ALL || r.cuisine_type == cuisine)
            .filter(|r| neighborhood == FILTER_ALL || r.neighborhood == neighborhood)
            .cloned()
            .collect())
    }

    pub async fn neighborhoods(&self) -> Result<Vec<String>> {
        let restaurants = self.all().await?;
        Ok(unique(restaurants.iter().map(|r| r.neighborhood.as_str())))
    }

    pub async fn cuisines(&self) -> Result<Vec<String>> {
        let restaurants = self.all().await?;
        Ok(unique(restaurants.iter().map(|r| r.cuisine_type.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(id: u32, photograph: Option<&str>) -> Restaurant {
        Restaurant {
            id,
            name: format!("Place {id}"),
            neighborhood: "Manhattan".to_string(),
            photograph: photograph.map(str::to_string),
            address: "1 Main St".to_string(),
            latlng: LatLng { lat: 40.7, lng: -73.9 },
            cuisine_type: "Pizza".to_string(),
            operating_hours: None,
            reviews: None,
        }
    }

    #[test]
    fn url_for_restaurant_uses_id_param() {
        assert_eq!(url_for_restaurant(&restaurant(3, None)), "/restaurant/?id=3");
    }

    #[test]
    fn image_url_only_with_photograph() {
        assert_eq!(
            image_url_for_restaurant(&restaurant(1, Some("1.jpg"))).as_deref(),
            Some("/img/1.jpg")
        );
        assert!(image_url_for_restaurant(&restaurant(1, None)).is_none());
    }

    #[test]
    fn restaurant_id_reads_query() {
        let url = Url::parse("http://localhost:8000/restaurant/?id=3").unwrap();
        assert_eq!(restaurant_id(&url).as_deref(), Some("3"));
    }

    #[test]
    fn restaurant_id_missing() {
        let url = Url::parse("http://localhost:8000/restaurant/").unwrap();
        assert!(restaurant_id(&url).is_none());
        let url = Url::parse("http://localhost:8000/restaurant/?name=x").unwrap();
        assert!(restaurant_id(&url).is_none());
    }

    #[test]
    fn unique_keeps_first_seen_order() {
        let values = ["Queens", "Manhattan", "Queens", "Brooklyn", "Manhattan"];
        assert_eq!(
            unique(values.iter().copied()),
            vec!["Queens", "Manhattan", "Brooklyn"]
        );
    }

    #[test]
    fn data_error_messages() {
        assert_eq!(
            DataError::NotFound("42".to_string()).to_string(),
            "No restaurant with id 42 found."
        );
        assert_eq!(
            DataError::RequestFailed(500).to_string(),
            "Request failed. Returned status of 500"
        );
    }
}
