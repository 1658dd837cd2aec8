//! `ragwise filters`: Show what metadata a query would be filtered on.

use ragwise_config::AppConfig;
use ragwise_retrieval::{analyze_filters, extract_filters};

pub fn run(query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let filters = extract_filters(query, config.retrieval.current_year);
    let report = serde_json::json!({
        "query": query,
        "extracted_filters": filters,
        "analysis": analyze_filters(query),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
