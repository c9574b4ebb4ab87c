use std::sync::Arc;
use url::Url;

use restaurant_reviews::data::{DataError, RestaurantDb};
use restaurant_reviews::worker::mock::MockFetcher;

const DATA_URL: &str = "http://localhost:8000/data/restaurants.json";
const FIXTURE: &str = include_str!("fixtures/restaurants.json");

fn db_with(network: Arc<MockFetcher>) -> RestaurantDb {
    RestaurantDb::new(network, Url::parse(DATA_URL).unwrap())
}

fn fixture_db() -> (RestaurantDb, Arc<MockFetcher>) {
    let network = Arc::new(MockFetcher::new().with(DATA_URL, "application/json", FIXTURE));
    (db_with(Arc::clone(&network)), network)
}

fn ids(restaurants: &[restaurant_reviews::data::Restaurant]) -> Vec<u32> {
    restaurants.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn document_is_fetched_once() {
    let (db, network) = fixture_db();

    db.all().await.unwrap();
    db.cuisines().await.unwrap();
    db.neighborhoods().await.unwrap();
    db.by_id("2").await.unwrap();

    assert_eq!(network.calls_for(DATA_URL), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_fetch() {
    let (db, network) = fixture_db();

    let (all, cuisines, first) = tokio::join!(db.all(), db.cuisines(), db.by_id("1"));
    assert_eq!(all.unwrap().len(), 5);
    assert_eq!(cuisines.unwrap().len(), 3);
    assert_eq!(first.unwrap().name, "Mission Chinese Food");
    assert_eq!(network.calls_for(DATA_URL), 1);
}

#[tokio::test]
async fn all_all_returns_every_restaurant() {
    let (db, _) = fixture_db();
    let restaurants = db.by_cuisine_and_neighborhood("all", "all").await.unwrap();
    assert_eq!(ids(&restaurants), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn filters_combine() {
    let (db, _) = fixture_db();

    let pizza = db.by_cuisine("Pizza").await.unwrap();
    assert_eq!(ids(&pizza), vec![2, 5]);

    let manhattan = db.by_neighborhood("Manhattan").await.unwrap();
    assert_eq!(ids(&manhattan), vec![1, 3, 4]);

    let asian_manhattan = db
        .by_cuisine_and_neighborhood("Asian", "Manhattan")
        .await
        .unwrap();
    assert_eq!(ids(&asian_manhattan), vec![1, 3]);

    let none = db
        .by_cuisine_and_neighborhood("Pizza", "Manhattan")
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn unique_values_in_first_seen_order() {
    let (db, _) = fixture_db();
    assert_eq!(db.neighborhoods().await.unwrap(), vec!["Manhattan", "Brooklyn"]);
    assert_eq!(db.cuisines().await.unwrap(), vec!["Asian", "Pizza", "American"]);
}

#[tokio::test]
async fn by_id_finds_and_misses() {
    let (db, _) = fixture_db();

    let katz = db.by_id("4").await.unwrap();
    assert!(katz.photograph.is_none());

    let err = db.by_id("42").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::NotFound(id)) if id == "42"
    ));
    assert_eq!(err.to_string(), "No restaurant with id 42 found.");

    assert!(db.by_id("abc").await.is_err());
}

#[tokio::test]
async fn error_status_is_request_failed() {
    let network = Arc::new(MockFetcher::new());
    network.serve(DATA_URL, 500, "text/plain", "boom");
    let db = db_with(network);

    let err = db.all().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataError>(),
        Some(DataError::RequestFailed(500))
    ));
    assert_eq!(err.to_string(), "Request failed. Returned status of 500");
}

#[tokio::test]
async fn failure_is_not_memoized() {
    let network = Arc::new(MockFetcher::new());
    network.set_offline(true);
    let db = db_with(Arc::clone(&network));

    assert!(db.all().await.is_err());

    network.set_offline(false);
    network.serve(DATA_URL, 200, "application/json", FIXTURE);
    assert_eq!(db.all().await.unwrap().len(), 5);
    assert_eq!(network.calls_for(DATA_URL), 2);
}

#[tokio::test]
async fn malformed_document_is_an_error() {
    let network = MockFetcher::new().with(DATA_URL, "application/json", r#"{"restaurants": 3}"#);
    let network = Arc::new(network);
    let db = db_with(network);
    assert!(db.all().await.is_err());
}
