//! Input document shapes accepted by the graph view.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered metadata attached to a node, keyed by field name.
pub type Metadata = IndexMap<String, MetaValue>;

/// Reasons a graph document can be rejected.
#[derive(Debug, Error)]
pub enum LoadError {
	/// The document has no `graph` section.
	#[error("invalid graph document: missing `graph` section")]
	MissingGraph,
	/// The document text is not valid JSON for a graph document.
	#[error("failed to parse graph document: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Top-level document: `{ "graph": { ... } }`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphDocument {
	#[serde(default)]
	pub graph: Option<GraphSection>,
}

impl GraphDocument {
	/// Decodes a document from JSON text.
	pub fn from_json(text: &str) -> Result<Self, LoadError> {
		Ok(serde_json::from_str(text)?)
	}

	/// Returns the graph section, or an error when it is absent.
	pub fn section(&self) -> Result<&GraphSection, LoadError> {
		self.graph.as_ref().ok_or(LoadError::MissingGraph)
	}
}

/// The `graph` section of a document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphSection {
	/// Default directedness for edges that carry no override.
	#[serde(default)]
	pub directed: Option<bool>,
	#[serde(default)]
	pub label: Option<String>,
	/// Node records keyed by id, in document order.
	#[serde(default)]
	pub nodes: IndexMap<String, NodeRecord>,
	#[serde(default)]
	pub edges: Vec<EdgeRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NodeRecord {
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub metadata: Metadata,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EdgeRecord {
	pub source: String,
	pub target: String,
	#[serde(default)]
	pub relation: Option<String>,
	#[serde(default)]
	pub directed: Option<bool>,
}

/// A metadata value. Documents are expected to carry scalars; anything else
/// is kept verbatim and shown as JSON text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
	Null,
	Bool(bool),
	Number(serde_json::Number),
	Text(String),
	Structured(serde_json::Value),
}

impl MetaValue {
	/// Null, `false`, zero and the empty string count as blank.
	pub fn is_blank(&self) -> bool {
		match self {
			MetaValue::Null => true,
			MetaValue::Bool(b) => !b,
			MetaValue::Number(n) => n.as_f64() == Some(0.0),
			MetaValue::Text(s) => s.is_empty(),
			MetaValue::Structured(_) => false,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, MetaValue::Null)
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			MetaValue::Text(s) => Some(s),
			_ => None,
		}
	}
}

/// Whole floats such as `10.0` print without a fraction.
fn integral(n: &serde_json::Number) -> Option<i64> {
	if n.is_i64() || n.is_u64() {
		return None;
	}
	n.as_f64()
		.filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
		.map(|f| f as i64)
}

impl fmt::Display for MetaValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MetaValue::Null => Ok(()),
			MetaValue::Bool(b) => write!(f, "{b}"),
			MetaValue::Number(n) => match integral(n) {
				Some(i) => write!(f, "{i}"),
				None => write!(f, "{n}"),
			},
			MetaValue::Text(s) => f.write_str(s),
			MetaValue::Structured(v) => write!(f, "{v}"),
		}
	}
}
