//! The `TaskList` wire schema.
//!
//! One set of types serves both codecs: the `prost` attributes define the
//! protobuf encoding, the serde attributes the JSON one. Field tags must stay
//! stable once clients exist.

use serde::{Deserialize, Serialize};

// ─── Root ────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[prost(message, repeated, tag = "1")]
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub name: String,
    /// Field area in square metres.
    #[prost(double, tag = "3")]
    pub area: f64,
    #[prost(message, optional, tag = "4")]
    #[serde(default)]
    pub boundary: Option<Boundary>,
    #[prost(message, repeated, tag = "5")]
    #[serde(default)]
    pub crop_seasons_v2: Vec<CropSeason>,
}

// ─── Geometry ────────────────────────────────────────────────────

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    /// GeoJSON-style geometry type, e.g. "MultiPolygon"
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(message, repeated, tag = "2")]
    #[serde(default)]
    pub coordinates: Vec<MultiPolygon>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPolygon {
    #[prost(message, repeated, tag = "1")]
    #[serde(default)]
    pub polygons: Vec<Polygon>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    #[prost(message, repeated, tag = "1")]
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
}

#[derive(Clone, Copy, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    #[prost(double, tag = "1")]
    pub lon: f64,
    #[prost(double, tag = "2")]
    pub lat: f64,
}

// ─── Seasons ─────────────────────────────────────────────────────

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSeason {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(bool, tag = "2")]
    pub is_healthy_field: bool,
    #[prost(string, tag = "3")]
    pub lifecycle_state: String,
    #[prost(message, optional, tag = "4")]
    #[serde(default)]
    pub crop: Option<Crop>,
    #[prost(string, tag = "5")]
    pub start_date: String,
    #[prost(message, optional, tag = "6")]
    #[serde(default)]
    pub variety: Option<Variety>,
    #[prost(message, repeated, tag = "7")]
    #[serde(default)]
    pub sprayings_v2: Vec<Spraying>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    #[prost(string, tag = "1")]
    pub uuid: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variety {
    #[prost(string, tag = "1")]
    pub name: String,
}

// ─── Applications ────────────────────────────────────────────────

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spraying {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub planned_date: String,
    #[prost(string, tag = "3")]
    pub execution_date: String,
    #[prost(string, tag = "4")]
    pub state: String,
    #[prost(string, tag = "5")]
    pub assignment_state: String,
    #[prost(string, tag = "6")]
    pub assignee: String,
    #[prost(message, optional, tag = "7")]
    #[serde(default)]
    pub dosed_map: Option<DosedMap>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosedMap {
    #[prost(string, tag = "1")]
    pub uuid: String,
    #[prost(string, tag = "2")]
    pub creation_flow_hint: String,
    #[prost(string, tag = "3")]
    pub application_type: String,
    #[prost(string, tag = "4")]
    pub application_mode: String,
    #[prost(message, repeated, tag = "5")]
    #[serde(default)]
    pub recipe_v2: Vec<Recipe>,
    #[prost(string, repeated, tag = "6")]
    #[serde(default)]
    pub action_types: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub r#type: String,
}
