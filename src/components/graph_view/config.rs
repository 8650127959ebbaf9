//! View configuration and the lookup tables used for colouring and tooltips.

use indexmap::IndexMap;

use super::types::Metadata;

/// Marker reference offset relative to the node radius.
pub const ARROW_OFFSET_RATIO: f64 = 2.5;

/// Most metadata fields a tooltip will show.
pub const MAX_TOOLTIP_FIELDS: usize = 6;

const TYPE_COLORS: &[(&str, &str)] = &[
	("Vulnerability", "#f87171"),
	("Weakness", "#fbbf24"),
	("Tactic", "#34d399"),
	("Technique", "#a78bfa"),
	("Command", "#f472b6"),
	("Tool", "#fb923c"),
	("Framework", "#a3e635"),
	("Detection", "#38bdf8"),
	("Guide", "#c084fc"),
	("Asset", "#60a5fa"),
];

const TOOLTIP_KEYS: &[(&str, &str)] = &[
	("cvss", "CVSS Score"),
	("category", "Category"),
	("platform", "Platform"),
	("purpose", "Purpose"),
	("os", "Operating System"),
	("ip", "IP Address"),
];

/// Node type to fill colour.
#[derive(Clone, Debug, PartialEq)]
pub struct TypePalette {
	colors: IndexMap<String, String>,
}

impl Default for TypePalette {
	fn default() -> Self {
		Self {
			colors: TYPE_COLORS
				.iter()
				.map(|&(ty, color)| (ty.to_owned(), color.to_owned()))
				.collect(),
		}
	}
}

impl TypePalette {
	/// An empty palette: every node gets the default colour.
	pub fn empty() -> Self {
		Self {
			colors: IndexMap::new(),
		}
	}

	/// Adds or replaces the colour for a type.
	pub fn with_entry(mut self, ty: impl Into<String>, color: impl Into<String>) -> Self {
		self.colors.insert(ty.into(), color.into());
		self
	}

	pub fn color_for(&self, ty: Option<&str>) -> Option<&str> {
		ty.and_then(|ty| self.colors.get(ty)).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.colors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.colors.iter().map(|(t, c)| (t.as_str(), c.as_str()))
	}
}

/// Metadata keys shown in node tooltips, in display order, with their labels.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipFields {
	labels: IndexMap<String, String>,
}

impl Default for TooltipFields {
	fn default() -> Self {
		Self {
			labels: TOOLTIP_KEYS
				.iter()
				.map(|&(key, label)| (key.to_owned(), label.to_owned()))
				.collect(),
		}
	}
}

impl TooltipFields {
	/// Appends a field (or relabels an existing one, keeping its position).
	pub fn with_field(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
		self.labels.insert(key.into(), label.into());
		self
	}

	/// The `(label, value)` pairs to display for `metadata`, skipping blank
	/// and absent fields.
	pub fn select(&self, metadata: &Metadata) -> Vec<(String, String)> {
		self.labels
			.iter()
			.filter_map(|(key, label)| {
				metadata
					.get(key)
					.filter(|v| !v.is_blank())
					.map(|v| (label.clone(), v.to_string()))
			})
			.take(MAX_TOOLTIP_FIELDS)
			.collect()
	}
}

/// Rendering configuration for a graph view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
	pub node_radius: f64,
	/// Fill for nodes whose type is absent or not in the palette.
	pub node_color: String,
	pub edge_color: String,
	pub highlight_color: String,
	pub edge_width: f64,
	pub arrow_size: f64,
	pub label_font_size: f64,
	pub label_color: String,
	pub background: String,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub palette: TypePalette,
	pub tooltip_fields: TooltipFields,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			node_radius: 8.0,
			node_color: "#4f46e5".into(),
			edge_color: "#9ca3af".into(),
			highlight_color: "#6366f1".into(),
			edge_width: 1.5,
			arrow_size: 6.0,
			label_font_size: 10.0,
			label_color: "#4b5563".into(),
			background: "#f9fafb".into(),
			min_zoom: 0.1,
			max_zoom: 8.0,
			palette: TypePalette::default(),
			tooltip_fields: TooltipFields::default(),
		}
	}
}

impl ViewConfig {
	/// Colour for a node of the given type.
	pub fn node_color_for(&self, ty: Option<&str>) -> &str {
		self.palette.color_for(ty).unwrap_or(&self.node_color)
	}

	pub fn marker_offset(&self) -> f64 {
		self.node_radius * ARROW_OFFSET_RATIO
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::types::MetaValue;

	fn metadata(json: serde_json::Value) -> Metadata {
		serde_json::from_value(json).unwrap()
	}

	#[test]
	fn palette_covers_known_types_and_falls_back() {
		let config = ViewConfig::default();
		assert_eq!(config.palette.len(), 10);
		assert_eq!(config.node_color_for(Some("Tool")), "#fb923c");
		assert_eq!(config.node_color_for(Some("tool")), "#4f46e5");
		assert_eq!(config.node_color_for(None), "#4f46e5");
	}

	#[test]
	fn palette_can_be_extended() {
		let palette = TypePalette::empty().with_entry("Host", "#000000");
		assert_eq!(palette.color_for(Some("Host")), Some("#000000"));
		assert_eq!(palette.iter().count(), 1);
	}

	#[test]
	fn tooltip_fields_keep_priority_order() {
		let meta = metadata(serde_json::json!({
			"ip": "10.0.0.1",
			"unrelated": "x",
			"category": "RCE",
			"cvss": 10.0,
			"platform": "",
		}));
		let fields = TooltipFields::default().select(&meta);
		assert_eq!(
			fields,
			[
				("CVSS Score".to_owned(), "10.0".to_owned()),
				("Category".to_owned(), "RCE".to_owned()),
				("IP Address".to_owned(), "10.0.0.1".to_owned()),
			]
		);
	}

	#[test]
	fn tooltip_caps_field_count() {
		let mut fields = TooltipFields::default();
		let mut meta = Metadata::new();
		for key in ["cvss", "category", "platform", "purpose", "os", "ip", "owner"] {
			meta.insert(key.into(), MetaValue::Text(key.to_uppercase()));
		}
		fields = fields.with_field("owner", "Owner");
		assert_eq!(fields.select(&meta).len(), MAX_TOOLTIP_FIELDS);
	}

	#[test]
	fn marker_offset_tracks_radius() {
		let config = ViewConfig {
			node_radius: 20.0,
			..ViewConfig::default()
		};
		assert_eq!(config.marker_offset(), 50.0);
	}
}
