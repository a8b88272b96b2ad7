//! Wire types for the SpaceX launch API (v5)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A launch record as returned by `/launches/*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchJson {
    pub id: String,
    pub name: String,
    pub date_utc: String,
    #[serde(default)]
    pub flight_number: Option<i64>,
    #[serde(default)]
    pub upcoming: bool,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub launchpad: Option<String>,
    #[serde(default)]
    pub fairings: Option<FairingsJson>,
    #[serde(default)]
    pub links: Option<LinksJson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FairingsJson {
    #[serde(default)]
    pub reused: Option<bool>,
    #[serde(default)]
    pub recovery_attempt: Option<bool>,
    #[serde(default)]
    pub recovered: Option<bool>,
    #[serde(default)]
    pub ships: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinksJson {
    #[serde(default)]
    pub patch: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub reddit: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub flickr: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub presskit: Option<String>,
    #[serde(default)]
    pub webcast: Option<String>,
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub wikipedia: Option<String>,
}

/// `/launches/latest` answers with one object, the other feeds with an array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<LaunchJson>),
    One(Box<LaunchJson>),
}

/// Parse a feed response body, accepting a single launch or an array
pub fn parse_launches(body: &str) -> serde_json::Result<Vec<LaunchJson>> {
    Ok(match serde_json::from_str(body)? {
        OneOrMany::Many(launches) => launches,
        OneOrMany::One(launch) => vec![*launch],
    })
}
