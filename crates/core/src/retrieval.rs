//! Retrieval domain: metadata filters, passages, and the vector index.
//!
//! The vector index is a black box: given a query, a result count and an
//! optional [`FilterSet`], it returns passages with their metadata. How
//! embeddings are computed or how the index is kept consistent is not
//! this crate's business.

use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Owning department of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "AI Research")]
    AiResearch,
    #[serde(rename = "ML Engineering")]
    MlEngineering,
    #[serde(rename = "Data Science")]
    DataScience,
    #[serde(rename = "Product")]
    Product,
    #[serde(rename = "Engineering")]
    Engineering,
    #[serde(rename = "R&D")]
    RnD,
    #[serde(rename = "Analytics")]
    Analytics,
    #[serde(rename = "Platform")]
    Platform,
}

impl Department {
    pub const ALL: [Department; 8] = [
        Department::AiResearch,
        Department::MlEngineering,
        Department::DataScience,
        Department::Product,
        Department::Engineering,
        Department::RnD,
        Department::Analytics,
        Department::Platform,
    ];

    /// The canonical metadata value stored in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::AiResearch => "AI Research",
            Department::MlEngineering => "ML Engineering",
            Department::DataScience => "Data Science",
            Department::Product => "Product",
            Department::Engineering => "Engineering",
            Department::RnD => "R&D",
            Department::Analytics => "Analytics",
            Department::Platform => "Platform",
        }
    }
}

/// Kind of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "Research Paper")]
    ResearchPaper,
    #[serde(rename = "Technical Guide")]
    TechnicalGuide,
    #[serde(rename = "API Documentation")]
    ApiDocumentation,
    #[serde(rename = "Best Practices")]
    BestPractices,
    #[serde(rename = "Implementation Guide")]
    ImplementationGuide,
    #[serde(rename = "Technical Report")]
    TechnicalReport,
    #[serde(rename = "System Design")]
    SystemDesign,
    #[serde(rename = "Tutorial")]
    Tutorial,
}

impl DocType {
    pub const ALL: [DocType; 8] = [
        DocType::ResearchPaper,
        DocType::TechnicalGuide,
        DocType::ApiDocumentation,
        DocType::BestPractices,
        DocType::ImplementationGuide,
        DocType::TechnicalReport,
        DocType::SystemDesign,
        DocType::Tutorial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::ResearchPaper => "Research Paper",
            DocType::TechnicalGuide => "Technical Guide",
            DocType::ApiDocumentation => "API Documentation",
            DocType::BestPractices => "Best Practices",
            DocType::ImplementationGuide => "Implementation Guide",
            DocType::TechnicalReport => "Technical Report",
            DocType::SystemDesign => "System Design",
            DocType::Tutorial => "Tutorial",
        }
    }
}

/// Access classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    Confidential,
    Secret,
    Internal,
    Public,
    Restricted,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 5] = [
        SecurityLevel::Confidential,
        SecurityLevel::Secret,
        SecurityLevel::Internal,
        SecurityLevel::Public,
        SecurityLevel::Restricted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Confidential => "Confidential",
            SecurityLevel::Secret => "Secret",
            SecurityLevel::Internal => "Internal",
            SecurityLevel::Public => "Public",
            SecurityLevel::Restricted => "Restricted",
        }
    }
}

/// Error returned when a string names no known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

fn parse_canonical<T: Copy>(
    kind: &'static str,
    s: &str,
    all: &[T],
    as_str: fn(&T) -> &'static str,
) -> Result<T, UnknownValue> {
    let wanted = s.trim();
    all.iter()
        .find(|v| as_str(v).eq_ignore_ascii_case(wanted))
        .copied()
        .ok_or_else(|| UnknownValue {
            kind,
            value: s.to_string(),
        })
}

impl FromStr for Department {
    type Err = UnknownValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical("department", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for DocType {
    type Err = UnknownValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical("document type", s, &Self::ALL, Self::as_str)
    }
}

impl FromStr for SecurityLevel {
    type Err = UnknownValue;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical("security level", s, &Self::ALL, Self::as_str)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured metadata constraints narrowing a retrieval query.
///
/// A `None` field means "no constraint". There is no wildcard value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_level: Option<SecurityLevel>,
}

impl FilterSet {
    /// True when no field constrains the search.
    pub fn is_empty(&self) -> bool {
        self.department.is_none()
            && self.doc_type.is_none()
            && self.year.is_none()
            && self.security_level.is_none()
    }

    /// The constraints as `(metadata key, value)` pairs, in a fixed order.
    pub fn conditions(&self) -> Vec<(&'static str, serde_json::Value)> {
        let mut out = Vec::new();
        if let Some(d) = self.department {
            out.push(("department", serde_json::Value::from(d.as_str())));
        }
        if let Some(t) = self.doc_type {
            out.push(("doc_type", serde_json::Value::from(t.as_str())));
        }
        if let Some(y) = self.year {
            out.push(("year", serde_json::Value::from(y)));
        }
        if let Some(s) = self.security_level {
            out.push(("security_level", serde_json::Value::from(s.as_str())));
        }
        out
    }

    /// Whether a passage's metadata satisfies every present constraint.
    pub fn matches(&self, metadata: &PassageMetadata) -> bool {
        let text_eq = |want: Option<&'static str>, have: &Option<String>| match want {
            None => true,
            Some(w) => have.as_deref() == Some(w),
        };
        text_eq(self.department.map(|d| d.as_str()), &metadata.department)
            && text_eq(self.doc_type.map(|t| t.as_str()), &metadata.doc_type)
            && text_eq(
                self.security_level.map(|s| s.as_str()),
                &metadata.security_level,
            )
            && self.year.is_none_or(|y| metadata.year == Some(y))
    }
}

/// Metadata attached to a passage by the index. Known filter fields are
/// typed loosely (the index may hold values outside our enums); anything
/// else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_level: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A unit of retrieved text plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub metadata: PassageMetadata,
}

/// The vector index collaborator.
///
/// Implementations must be idempotent and side-effect free from the
/// engine's point of view.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name (e.g., "qdrant", "in_memory").
    fn name(&self) -> &str;

    /// Return up to `k` passages most similar to `query`, restricted to
    /// passages matching `filter` when one is given.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&FilterSet>,
    ) -> std::result::Result<Vec<RetrievedPassage>, RetrievalError>;
}
