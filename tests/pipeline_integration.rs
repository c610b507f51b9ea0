//! End-to-end tests: mock site -> acquisition -> local blob store -> extraction -> report.

use chrono::NaiveDate;
use listings_pipeline::config::{Config, Delimiter};
use listings_pipeline::jobs::{AcquisitionJob, ExtractionJob};
use listings_pipeline::site::{FieldValue, ListingExtractor};
use listings_pipeline::storage::{BlobStore, LocalBlobStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STRUCTURED_FIXTURE: &str = include_str!("fixtures/structured_page.html");
const MARKUP_FIXTURE: &str = include_str!("fixtures/markup_page.html");

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn make_test_config(base_url: String, store: &TempDir) -> Config {
    Config {
        base_url,
        store_root: store.path().to_path_buf(),
        page_count: 3,
        backoff_unit_ms: 1,
        ..Config::default()
    }
}

#[test]
fn test_parse_structured_fixture() {
    let records = ListingExtractor::new().extract(STRUCTURED_FIXTURE, date());

    // Third entry has a malformed address and is skipped
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.neighborhood, FieldValue::text("Chapinero Alto"));
    assert_eq!(first.price, FieldValue::text("850000000"));
    assert_eq!(first.bedroom_count, FieldValue::from(3));
    assert_eq!(first.bathroom_count, FieldValue::from(2));
    assert_eq!(first.area_value, FieldValue::from(120));

    let second = &records[1];
    assert_eq!(second.neighborhood, FieldValue::text("Cedritos"));
    assert!(second.price.is_missing());
    assert!(second.bathroom_count.is_missing());
    assert_eq!(second.area_value.to_string(), "98.5");

    let third = &records[2];
    assert_eq!(third.neighborhood, FieldValue::text("Usaquén"));
    assert_eq!(third.price, FieldValue::text("420000000"));
    assert_eq!(third.bedroom_count, FieldValue::text("2"));
}

#[test]
fn test_parse_markup_fixture() {
    let records = ListingExtractor::new().extract(MARKUP_FIXTURE, date());
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].neighborhood, FieldValue::text("Teusaquillo"));
    assert_eq!(records[0].price, FieldValue::text("610000000"));
    assert_eq!(records[0].area_value, FieldValue::text("140"));

    assert_eq!(records[1].neighborhood, FieldValue::text("Kennedy"));
    assert_eq!(records[1].price, FieldValue::text("Consultar"));
    assert!(records[1].bathroom_count.is_missing());
    assert!(records[1].area_value.is_missing());
}

#[tokio::test]
async fn test_full_pipeline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/casas/bogota"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STRUCTURED_FIXTURE))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/casas/bogota"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MARKUP_FIXTURE))
        .mount(&mock_server)
        .await;

    // Page 3 never recovers
    Mock::given(method("GET"))
        .and(path("/casas/bogota"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = make_test_config(format!("{}/casas/bogota", mock_server.uri()), &dir);
    let store = LocalBlobStore::new(dir.path());

    let acquired = AcquisitionJob::new(config.clone(), date()).run(&store).await;
    assert!(acquired.is_ok());
    assert_eq!(acquired.summary, "2 of 3 pages saved");

    let pages = store.list(&config.landing_bucket, "2025-03-10/").await.unwrap();
    assert_eq!(
        pages,
        vec!["2025-03-10/2025-03-10-page1.html", "2025-03-10/2025-03-10-page2.html"]
    );

    let extracted = ExtractionJob::new(config.clone(), date()).run(&store).await;
    assert!(extracted.is_ok());

    let body = store.get(&config.final_bucket, "2025-03-10/2025-03-10.csv").await.unwrap();
    let csv = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "FechaDescarga,Barrio,Valor,NumHabitaciones,NumBanos,mts2");
    assert_eq!(lines.len(), 1 + 3 + 2);
    assert_eq!(lines[1], "2025-03-10,Chapinero Alto,850000000,3,2,120");
    assert_eq!(lines[2], "2025-03-10,Cedritos,N/A,4,N/A,98.5");
    assert_eq!(lines[4], "2025-03-10,Teusaquillo,610000000,4,3,140");
}

#[tokio::test]
async fn test_extraction_without_acquisition() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        store_root: dir.path().to_path_buf(),
        delimiter: Delimiter::Semicolon,
        ..Config::default()
    };
    let store = LocalBlobStore::new(dir.path());

    let status = ExtractionJob::new(config.clone(), date()).run(&store).await;

    assert!(status.is_ok());
    assert_eq!(status.summary, "nothing to process");
    assert!(store.list(&config.final_bucket, "").await.unwrap().is_empty());
}
