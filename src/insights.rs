//! Model-assisted pricing insights.
//!
//! Builds prompts from a small, revenue-ranked sample of the snapshot and
//! parses the JSON the model answers with. Responses arrive wrapped in
//! Markdown code fences often enough that stripping them is part of the
//! contract. Everything here degrades: a response that cannot be parsed
//! becomes an empty classification, never a failed run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::constants::CLUSTER_SAMPLE_SIZE;
use crate::domain::PricePoint;
use crate::error::{PricewatchError, Result};
use crate::observability::metrics;

/// A text-completion backend. The shipped implementation replays a saved
/// response file; a live client can slot in behind the same seam.
pub trait TextModel {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Replays a model response captured earlier, e.g. from a console session.
pub struct SavedResponse {
    path: std::path::PathBuf,
}

impl SavedResponse {
    pub fn new<P: Into<std::path::PathBuf>>(path: P) -> Self {
        SavedResponse { path: path.into() }
    }
}

impl TextModel for SavedResponse {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?(.*?)```").unwrap());

/// Strip a Markdown code fence if one wraps the payload.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.contains("```") {
        if let Some(captures) = CODE_FENCE.captures(trimmed) {
            return captures[1].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Strategic cluster a sku can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Cluster {
    CashCow,
    Battleground,
    Opportunity,
    DeadStock,
    Other(String),
}

impl From<String> for Cluster {
    fn from(label: String) -> Self {
        match label.trim() {
            "Cash Cow" => Cluster::CashCow,
            "Battleground" => Cluster::Battleground,
            "Opportunity" => Cluster::Opportunity,
            "Dead Stock" => Cluster::DeadStock,
            other => Cluster::Other(other.to_string()),
        }
    }
}

impl From<Cluster> for String {
    fn from(cluster: Cluster) -> Self {
        match cluster {
            Cluster::CashCow => "Cash Cow".to_string(),
            Cluster::Battleground => "Battleground".to_string(),
            Cluster::Opportunity => "Opportunity".to_string(),
            Cluster::DeadStock => "Dead Stock".to_string(),
            Cluster::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    #[serde(rename = "Sku")]
    pub sku: String,
    #[serde(rename = "Cluster")]
    pub cluster: Cluster,
}

/// Pricing move recommended for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyKind {
    Attack,
    Defend,
    Align,
    Other(String),
}

impl From<String> for StrategyKind {
    fn from(label: String) -> Self {
        match label.trim() {
            "Attack" => StrategyKind::Attack,
            "Defend" => StrategyKind::Defend,
            "Align" => StrategyKind::Align,
            other => StrategyKind::Other(other.to_string()),
        }
    }
}

impl From<StrategyKind> for String {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Attack => "Attack".to_string(),
            StrategyKind::Defend => "Defend".to_string(),
            StrategyKind::Align => "Align".to_string(),
            StrategyKind::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAdvice {
    pub strategy: StrategyKind,
    pub recommended_price: f64,
    pub reason: String,
}

/// Top rows of the snapshot by revenue, the only slice worth a model call.
pub fn sample_for_clustering(snapshot: &[PricePoint]) -> Vec<&PricePoint> {
    let mut ranked: Vec<&PricePoint> = snapshot.iter().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.sku.cmp(&b.sku))
    });
    ranked.truncate(CLUSTER_SAMPLE_SIZE);
    ranked
}

/// Prompt asking the model to classify a sample of skus into clusters.
pub fn build_clustering_prompt(sample: &[&PricePoint]) -> String {
    let records: Vec<serde_json::Value> = sample
        .iter()
        .map(|point| {
            json!({
                "Sku": point.sku,
                "Product": point.product,
                "Price": point.price,
                "Comp_1_Price": point.competitor_price,
                "Rank": point.rank,
                "Revenue": point.revenue,
            })
        })
        .collect();

    format!(
        "Analyze this sales and pricing data: {}.\n\
         Classify every SKU into one of these strategic categories:\n\
         1. \"Cash Cow\" (high revenue, strong position)\n\
         2. \"Battleground\" (high revenue, uncompetitive price)\n\
         3. \"Opportunity\" (low revenue, but competitive price)\n\
         4. \"Dead Stock\" (low revenue, price out of the market)\n\n\
         Expected output: a pure JSON array: [{{ \"Sku\": \"...\", \"Cluster\": \"...\" }}]",
        serde_json::Value::Array(records)
    )
}

/// Prompt asking the model for a pricing move on one product.
pub fn build_strategy_prompt(point: &PricePoint) -> String {
    format!(
        "Role: senior pricing manager.\n\
         Product: {}\n\
         Our price: {}\n\
         Best competitor: {}\n\
         Current rank: {}\n\n\
         Respond in JSON:\n\
         {{\n\
         \x20 \"strategy\": \"Attack\" (if we can undercut) | \"Defend\" (if we have margin) | \"Align\",\n\
         \x20 \"recommended_price\": (float),\n\
         \x20 \"reason\": (max 10 words)\n\
         }}",
        point.product, point.price, point.competitor_price, point.rank
    )
}

/// Parse a clustering response. Any defect (bad JSON, wrong shape) degrades
/// to an empty assignment list with a logged warning.
pub fn parse_cluster_labels(response: &str) -> Vec<ClusterAssignment> {
    let payload = strip_code_fences(response);
    match serde_json::from_str::<Vec<ClusterAssignment>>(&payload) {
        Ok(assignments) => {
            metrics::model::response_parsed("clusters");
            assignments
        }
        Err(e) => {
            metrics::model::response_rejected("clusters");
            warn!("discarding unparseable clustering response: {}", e);
            Vec::new()
        }
    }
}

/// Parse a strategy response. Callers decide how to degrade.
pub fn parse_strategy(response: &str) -> Result<StrategyAdvice> {
    let payload = strip_code_fences(response);
    match serde_json::from_str::<StrategyAdvice>(&payload) {
        Ok(advice) => {
            metrics::model::response_parsed("strategy");
            Ok(advice)
        }
        Err(e) => {
            metrics::model::response_rejected("strategy");
            Err(PricewatchError::ModelResponse(format!(
                "strategy response was not the expected JSON shape: {}",
                e
            )))
        }
    }
}

/// Classify a snapshot with the given model: sample, prompt, parse.
pub fn classify_snapshot(
    model: &dyn TextModel,
    snapshot: &[PricePoint],
) -> Result<Vec<ClusterAssignment>> {
    let sample = sample_for_clustering(snapshot);
    if sample.is_empty() {
        return Ok(Vec::new());
    }
    let prompt = build_clustering_prompt(&sample);
    let response = model.generate(&prompt)?;
    Ok(parse_cluster_labels(&response))
}

/// Ask the model for a pricing move on one product.
pub fn advise_strategy(model: &dyn TextModel, point: &PricePoint) -> Result<StrategyAdvice> {
    let prompt = build_strategy_prompt(point);
    let response = model.generate(&prompt)?;
    parse_strategy(&response)
}
