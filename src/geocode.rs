//! Location search against public geocoders
//!
//! Providers are tried in order: Photon first (usually faster and more
//! stable), Nominatim as the fallback. Both response shapes are normalized
//! into `SearchResult` before anything else sees them.

use log::{info, warn};
use serde_json::Value;

use crate::models::SearchResult;

const PHOTON_ENDPOINT: &str = "https://photon.komoot.io/api/";
const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

const RESULT_LIMIT: u8 = 5;

/// One geocoding provider strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Provider {
    Photon,
    Nominatim,
}

/// Providers in the order they are tried.
const PROVIDERS: [Provider; 2] = [Provider::Photon, Provider::Nominatim];

impl Provider {
    fn name(&self) -> &'static str {
        match self {
            Provider::Photon => "photon",
            Provider::Nominatim => "nominatim",
        }
    }

    fn url(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        match self {
            Provider::Photon => format!(
                "{}?q={}&limit={}&lang=en",
                PHOTON_ENDPOINT, encoded, RESULT_LIMIT
            ),
            Provider::Nominatim => format!(
                "{}?format=json&q={}&limit={}&addressdetails=1",
                NOMINATIM_ENDPOINT, encoded, RESULT_LIMIT
            ),
        }
    }

    fn normalize(&self, body: &Value) -> Result<Vec<SearchResult>, String> {
        match self {
            Provider::Photon => normalize_photon(body),
            Provider::Nominatim => normalize_nominatim(body),
        }
    }
}

/// Runs the query against each provider in turn. A non-success status or a
/// request error moves on to the next provider; only when every provider
/// has failed does this return an error.
pub async fn search(query: &str) -> Result<Vec<SearchResult>, String> {
    let client = reqwest::Client::new();
    let mut last_error = String::new();

    for provider in PROVIDERS {
        match query_provider(&client, provider, query).await {
            Ok(results) => {
                info!(
                    "[geocode] {} returned {} result(s) for {:?}",
                    provider.name(),
                    results.len(),
                    query
                );
                return Ok(results);
            }
            Err(e) => {
                warn!("[geocode] {} failed: {}", provider.name(), e);
                last_error = e;
            }
        }
    }

    Err(format!("All geocoding providers failed: {}", last_error))
}

async fn query_provider(
    client: &reqwest::Client,
    provider: Provider,
    query: &str,
) -> Result<Vec<SearchResult>, String> {
    let response = client
        .get(provider.url(query))
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| format!("invalid JSON: {}", e))?;

    provider.normalize(&body)
}

/// Photon answers a GeoJSON feature collection: coordinates as
/// `[lon, lat]`, the display name assembled from name/city/country.
fn normalize_photon(body: &Value) -> Result<Vec<SearchResult>, String> {
    let features = body["features"]
        .as_array()
        .ok_or_else(|| "missing features array".to_string())?;

    let mut results = Vec::with_capacity(features.len());
    for feature in features {
        let coords = &feature["geometry"]["coordinates"];
        let (lon, lat) = match (coords[0].as_f64(), coords[1].as_f64()) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => continue,
        };

        let props = &feature["properties"];
        let mut display_name = match props["name"].as_str() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if let Some(city) = props["city"].as_str() {
            display_name.push_str(", ");
            display_name.push_str(city);
        }
        if let Some(country) = props["country"].as_str() {
            display_name.push_str(", ");
            display_name.push_str(country);
        }

        results.push(SearchResult {
            lat,
            lon,
            display_name,
        });
    }
    Ok(results)
}

/// Nominatim answers a flat list with lat/lon as decimal strings.
fn normalize_nominatim(body: &Value) -> Result<Vec<SearchResult>, String> {
    let entries = body
        .as_array()
        .ok_or_else(|| "expected a top-level array".to_string())?;

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let lat = parse_degree(&entry["lat"]);
        let lon = parse_degree(&entry["lon"]);
        let display_name = entry["display_name"].as_str();
        if let (Some(lat), Some(lon), Some(display_name)) = (lat, lon, display_name) {
            results.push(SearchResult {
                lat,
                lon,
                display_name: display_name.to_string(),
            });
        }
    }
    Ok(results)
}

fn parse_degree(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn photon_features_are_normalized() {
        let body = json!({
            "features": [
                {
                    "geometry": { "coordinates": [139.7005, 35.6595] },
                    "properties": { "name": "Shibuya", "city": "Tokyo", "country": "Japan" }
                },
                {
                    "geometry": { "coordinates": [2.3522, 48.8566] },
                    "properties": { "name": "Paris", "country": "France" }
                }
            ]
        });

        let results = normalize_photon(&body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].lat, 35.6595);
        assert_eq!(results[0].lon, 139.7005);
        assert_eq!(results[0].display_name, "Shibuya, Tokyo, Japan");
        assert_eq!(results[1].display_name, "Paris, France");
    }

    #[test]
    fn photon_features_without_name_or_coordinates_are_skipped() {
        let body = json!({
            "features": [
                { "geometry": { "coordinates": [1.0, 2.0] }, "properties": {} },
                { "geometry": { "coordinates": [] }, "properties": { "name": "Nowhere" } }
            ]
        });
        assert!(normalize_photon(&body).unwrap().is_empty());
    }

    #[test]
    fn photon_without_features_is_an_error() {
        assert!(normalize_photon(&json!({"type": "error"})).is_err());
    }

    #[test]
    fn nominatim_entries_are_normalized_with_string_degrees() {
        let body = json!([
            { "lat": "51.5074", "lon": "-0.1278", "display_name": "London, Greater London, England" },
            { "lat": "bogus", "lon": "-0.1", "display_name": "Broken" },
            { "lat": 40.4168, "lon": -3.7038, "display_name": "Madrid, Spain" }
        ]);

        let results = normalize_nominatim(&body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].lat, 51.5074);
        assert_eq!(results[0].lon, -0.1278);
        assert_eq!(results[0].display_name, "London, Greater London, England");
        assert_eq!(results[1].lat, 40.4168);
    }

    #[test]
    fn nominatim_non_array_is_an_error() {
        assert!(normalize_nominatim(&json!({"error": "rate limited"})).is_err());
    }

    #[test]
    fn empty_result_sets_are_ok_not_errors() {
        assert_eq!(normalize_photon(&json!({"features": []})).unwrap(), vec![]);
        assert_eq!(normalize_nominatim(&json!([])).unwrap(), vec![]);
    }

    #[test]
    fn provider_urls_encode_the_query() {
        let url = Provider::Photon.url("café de flore");
        assert!(url.starts_with(PHOTON_ENDPOINT));
        assert!(url.contains("q=caf%C3%A9%20de%20flore"));
        assert!(url.contains("limit=5"));
        assert!(url.contains("lang=en"));

        let url = Provider::Nominatim.url("tokyo tower");
        assert!(url.contains("format=json"));
        assert!(url.contains("q=tokyo%20tower"));
        assert!(url.contains("addressdetails=1"));
    }
}
