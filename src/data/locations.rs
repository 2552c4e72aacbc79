//! Static fallback locations
//!
//! A fixed list of well-known places used by location search when the
//! geocoding API cannot be reached or no credential is configured.

use super::LocationMatch;

/// A static location entry with an optional romanized alias
#[derive(Debug, Clone, Copy)]
pub struct MockLocation {
    pub name: &'static str,
    /// Romanized spelling for Korean names (e.g. "seoul" for "서울")
    pub alias: Option<&'static str>,
    pub country: &'static str,
    pub state: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl MockLocation {
    /// Case-insensitive substring match on name, state or alias
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.state.to_lowercase().contains(needle)
            || self.alias.is_some_and(|alias| alias.contains(needle))
    }

    fn to_match(self) -> LocationMatch {
        LocationMatch {
            name: self.name.to_string(),
            country: self.country.to_string(),
            state: Some(self.state.to_string()),
            lat: self.lat,
            lon: self.lon,
            local_names: None,
        }
    }
}

/// All fallback locations in display order
pub static MOCK_LOCATIONS: [MockLocation; 12] = [
    MockLocation {
        name: "서울",
        alias: Some("seoul"),
        country: "KR",
        state: "서울특별시",
        lat: 37.5665,
        lon: 126.9780,
    },
    MockLocation {
        name: "부산",
        alias: Some("busan"),
        country: "KR",
        state: "부산광역시",
        lat: 35.1796,
        lon: 129.0756,
    },
    MockLocation {
        name: "대구",
        alias: Some("daegu"),
        country: "KR",
        state: "대구광역시",
        lat: 35.8714,
        lon: 128.6014,
    },
    MockLocation {
        name: "인천",
        alias: Some("incheon"),
        country: "KR",
        state: "인천광역시",
        lat: 37.4563,
        lon: 126.7052,
    },
    MockLocation {
        name: "광주",
        alias: Some("gwangju"),
        country: "KR",
        state: "광주광역시",
        lat: 35.1595,
        lon: 126.8526,
    },
    MockLocation {
        name: "대전",
        alias: Some("daejeon"),
        country: "KR",
        state: "대전광역시",
        lat: 36.3504,
        lon: 127.3845,
    },
    MockLocation {
        name: "울산",
        alias: Some("ulsan"),
        country: "KR",
        state: "울산광역시",
        lat: 35.5384,
        lon: 129.3114,
    },
    MockLocation {
        name: "제주",
        alias: Some("jeju"),
        country: "KR",
        state: "제주특별자치도",
        lat: 33.4996,
        lon: 126.5312,
    },
    MockLocation {
        name: "Tokyo",
        alias: None,
        country: "JP",
        state: "Tokyo",
        lat: 35.6762,
        lon: 139.6503,
    },
    MockLocation {
        name: "New York",
        alias: None,
        country: "US",
        state: "New York",
        lat: 40.7128,
        lon: -74.0060,
    },
    MockLocation {
        name: "London",
        alias: None,
        country: "GB",
        state: "England",
        lat: 51.5074,
        lon: -0.1278,
    },
    MockLocation {
        name: "Paris",
        alias: None,
        country: "FR",
        state: "Île-de-France",
        lat: 48.8566,
        lon: 2.3522,
    },
];

/// Filters the fallback list by `query`, returning at most `limit` matches
///
/// A blank query matches nothing.
pub fn mock_locations(query: &str, limit: usize) -> Vec<LocationMatch> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    MOCK_LOCATIONS
        .iter()
        .filter(|location| location.matches(&needle))
        .take(limit)
        .map(|location| location.to_match())
        .collect()
}
