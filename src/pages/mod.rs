pub mod terminal;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;
use url::Url;

use crate::consts::FILTER_ALL;
use crate::data::{Restaurant, url_for_restaurant};
use crate::router::PageState;

/// Renders the page for a state. Implementations populate the page from
/// whatever data the state needs.
#[async_trait]
pub trait PageView: Send {
    async fn render(&mut self, state: Option<PageState>, url: &Url) -> Result<()>;
}

/// Owns the current page state and the view that renders it.
pub struct MainController<V: PageView> {
    state: Option<PageState>,
    view: V,
}

impl<V: PageView> MainController<V> {
    pub fn new(view: V) -> Self {
        Self { state: None, view }
    }

    /// Record the new state and render it. A failed render is logged; the
    /// state change stands.
    pub async fn set_state(&mut self, state: Option<PageState>, url: &Url) {
        self.state = state;
        if let Err(e) = self.view.render(state, url).await {
            warn!(url = %url, error = %e, "page render failed");
        }
    }

    pub fn state(&self) -> Option<PageState> {
        self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

/// The user's filter choice on the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub cuisine: String,
    pub neighborhood: String,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            cuisine: FILTER_ALL.to_string(),
            neighborhood: FILTER_ALL.to_string(),
        }
    }
}

/// A pin on the map, linking to the restaurant's page.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub url: String,
}

impl Marker {
    pub fn for_restaurant(restaurant: &Restaurant) -> Self {
        Self {
            lat: restaurant.latlng.lat,
            lng: restaurant.latlng.lng,
            title: restaurant.name.clone(),
            url: url_for_restaurant(restaurant),
        }
    }
}

/// Map viewport and the markers currently on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapModel {
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapModel {
    /// Recenter the map. Markers are dropped with the old map.
    pub fn init(&mut self, center: (f64, f64), zoom: u8) {
        self.center = center;
        self.zoom = zoom;
        self.markers.clear();
    }

    /// Replace all markers with one per restaurant.
    pub fn add_markers(&mut self, restaurants: &[Restaurant]) {
        self.reset_markers();
        self.markers
            .extend(restaurants.iter().map(Marker::for_restaurant));
    }

    pub fn add_marker(&mut self, restaurant: &Restaurant) {
        self.markers.push(Marker::for_restaurant(restaurant));
    }

    pub fn reset_markers(&mut self) {
        self.markers.clear();
    }
}
