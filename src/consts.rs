//! Project-wide constants.

use std::path::PathBuf;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Origin the app is served from when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Name of the cache store. Changing it invalidates everything cached so far.
pub const DEFAULT_CACHE_NAME: &str = "restaurant-reviews";

/// Worker script and the scope it controls.
pub const WORKER_SCRIPT: &str = "/sw.js";
pub const WORKER_SCOPE: &str = "/";

/// Static restaurant data, relative to the origin.
pub const DATABASE_PATH: &str = "/data/restaurants.json";

/// Core assets pre-populated into the cache when the worker installs.
pub const CACHE_MANIFEST: &[&str] = &[
    "/",
    "/css/styles.css",
    "/dist/js/app.js",
    DATABASE_PATH,
    "/img/1.jpg",
    "/img/2.jpg",
    "/img/3.jpg",
    "/img/4.jpg",
    "/img/5.jpg",
    "/img/6.jpg",
    "/img/7.jpg",
    "/img/8.jpg",
    "/img/9.jpg",
    "/img/10.jpg",
];

/// Map center and zoom for the index page.
pub const INDEX_MAP_CENTER: (f64, f64) = (40.722216, -73.987501);
pub const INDEX_MAP_ZOOM: u8 = 11;

/// Zoom used when the map is centered on a single restaurant.
pub const DETAILS_MAP_ZOOM: u8 = 16;

/// Filter value that disables cuisine or neighborhood filtering.
pub const FILTER_ALL: &str = "all";

/// Default database path: `~/.restaurant-reviews/cache.db`.
/// Single DB for the cache store and config.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".restaurant-reviews")
        .join("cache.db")
}

/// Human-readable byte size (e.g. 512 B, 3.4 KiB, 1.2 MiB).
pub fn format_bytes(n: u64) -> String {
    const KIB: f64 = 1024.0;
    let n_f = n as f64;
    if n_f < KIB {
        format!("{n} B")
    } else if n_f < KIB * KIB {
        format!("{:.1} KiB", n_f / KIB)
    } else {
        format!("{:.1} MiB", n_f / (KIB * KIB))
    }
}
