//! Yahoo Finance chart API response models.

use serde::Deserialize;

/// Top-level wrapper for the v8 chart endpoint.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartApiError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
}

/// The meta block carries everything we need for a latest quote; the
/// indicator arrays in the same payload are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub currency: Option<String>,
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub regular_market_time: Option<i64>,
    pub previous_close: Option<f64>,
}
