//! Plain-text rendering of the index and details pages.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Write;
use std::sync::Arc;
use url::Url;

use super::{FilterSelection, MapModel, PageView};
use crate::consts::{DETAILS_MAP_ZOOM, FILTER_ALL, INDEX_MAP_CENTER, INDEX_MAP_ZOOM};
use crate::data::{
    DataError, Restaurant, RestaurantDb, image_url_for_restaurant, restaurant_id,
    url_for_restaurant,
};
use crate::router::PageState;

const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Renders pages as text frames. The last frame is kept for inspection and
/// optionally echoed to stdout.
pub struct TerminalView {
    db: Arc<RestaurantDb>,
    filter: FilterSelection,
    map: MapModel,
    frame: String,
    echo: bool,
}

impl TerminalView {
    pub fn new(db: Arc<RestaurantDb>) -> Self {
        Self {
            db,
            filter: FilterSelection::default(),
            map: MapModel::default(),
            frame: String::new(),
            echo: false,
        }
    }

    /// Print every rendered frame to stdout.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn map(&self) -> &MapModel {
        &self.map
    }

    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterSelection) {
        self.filter = filter;
    }

    async fn render_index(&mut self) -> Result<String> {
        let neighborhoods = self.db.neighborhoods().await?;
        let cuisines = self.db.cuisines().await?;
        let restaurants = self
            .db
            .by_cuisine_and_neighborhood(&self.filter.cuisine, &self.filter.neighborhood)
            .await?;

        self.map.init(INDEX_MAP_CENTER, INDEX_MAP_ZOOM);
        self.map.add_markers(&restaurants);

        let mut out = String::new();
        writeln!(out, "Home")?;
        writeln!(out)?;
        writeln!(
            out,
            "  neighborhoods  {}  [{}]",
            options(&neighborhoods),
            self.filter.neighborhood
        )?;
        writeln!(
            out,
            "  cuisines       {}  [{}]",
            options(&cuisines),
            self.filter.cuisine
        )?;
        writeln!(out)?;

        if restaurants.is_empty() {
            writeln!(out, "  no restaurants match this filter")?;
        }
        for restaurant in &restaurants {
            write_summary(&mut out, restaurant)?;
        }

        writeln!(out)?;
        write_map(&mut out, &self.map)?;
        Ok(out)
    }

    async fn render_details(&mut self, url: &Url) -> Result<String> {
        let id = restaurant_id(url).ok_or(DataError::NoRestaurantId)?;
        let restaurant = self.db.by_id(&id).await?;

        self.map.init(
            (restaurant.latlng.lat, restaurant.latlng.lng),
            DETAILS_MAP_ZOOM,
        );
        self.map.add_marker(&restaurant);

        let mut out = String::new();
        writeln!(out, "Home › {}", restaurant.name)?;
        writeln!(out)?;
        writeln!(out, "  {}", restaurant.name)?;
        writeln!(out, "  {}", restaurant.cuisine_type)?;
        writeln!(out, "  {}", restaurant.address)?;
        if let Some(image) = image_url_for_restaurant(&restaurant) {
            writeln!(out, "  image {image}")?;
        }

        if let Some(hours) = &restaurant.operating_hours {
            writeln!(out)?;
            writeln!(out, "  Hours")?;
            let ordered = WEEKDAYS
                .iter()
                .filter_map(|day| hours.get_key_value(*day))
                .chain(hours.iter().filter(|(day, _)| !WEEKDAYS.contains(&day.as_str())));
            for (day, time) in ordered {
                writeln!(out, "    {day:<10} {time}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "  Reviews")?;
        match &restaurant.reviews {
            Some(reviews) if !reviews.is_empty() => {
                for review in reviews {
                    writeln!(
                        out,
                        "    {} · {} · Rating: {}",
                        review.name, review.date, review.rating
                    )?;
                    writeln!(out, "      {}", review.comments)?;
                }
            }
            _ => writeln!(out, "    No reviews yet!")?,
        }

        writeln!(out)?;
        write_map(&mut out, &self.map)?;
        Ok(out)
    }
}

fn options(values: &[String]) -> String {
    std::iter::once(FILTER_ALL)
        .chain(values.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_summary(out: &mut String, restaurant: &Restaurant) -> std::fmt::Result {
    writeln!(out, "  {}", restaurant.name)?;
    writeln!(out, "    {}", restaurant.neighborhood)?;
    writeln!(out, "    {}", restaurant.address)?;
    writeln!(out, "    {}", url_for_restaurant(restaurant))
}

fn write_map(out: &mut String, map: &MapModel) -> std::fmt::Result {
    let noun = if map.markers.len() == 1 { "marker" } else { "markers" };
    writeln!(
        out,
        "  map  {} {noun} around ({:.6}, {:.6}), zoom {}",
        map.markers.len(),
        map.center.0,
        map.center.1,
        map.zoom
    )
}

#[async_trait]
impl PageView for TerminalView {
    async fn render(&mut self, state: Option<PageState>, url: &Url) -> Result<()> {
        let rendered = match state {
            Some(PageState::Index) => self.render_index().await,
            Some(PageState::Details) => self.render_details(url).await,
            None => {
                self.map.reset_markers();
                Ok(String::new())
            }
        };

        let result = match rendered {
            Ok(frame) => {
                self.frame = frame;
                Ok(())
            }
            Err(e) => {
                self.frame = format!("  ✗ {e}\n");
                Err(e)
            }
        };

        if self.echo {
            print!("{}", self.frame);
        }
        result
    }
}
