//! Widget options and their defaults.
//!
//! User options are JSON objects merged over [`BeadnetOptions::default`]: any
//! field left out keeps its default. Colors that depend on other settings are
//! filled in by [`BeadnetOptions::resolved`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node fill colors, assigned round-robin as nodes are added.
pub const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Failure to read user options.
#[derive(Debug, Error)]
pub enum OptionsError {
	/// The JSON is malformed or a field has the wrong type.
	#[error("Failed to parse options: {0}")]
	Parse(#[from] serde_json::Error),
}

/// All widget settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BeadnetOptions {
	/// Canvas background.
	pub container: ContainerOptions,
	/// Node circles and labels.
	pub nodes: NodeOptions,
	/// Channel strokes and split labels.
	pub channels: ChannelOptions,
	/// Bead size, style and transfer timing.
	pub beads: BeadOptions,
	/// Force layout.
	pub simulation: SimulationOptions,
}

/// Canvas settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerOptions {
	/// Fill behind everything; also the default node outline.
	pub background_color: String,
}

/// Node settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeOptions {
	/// Circle radius in graph units.
	pub radius: f64,
	/// Fallback fill; `None` uses the palette.
	pub color: Option<String>,
	/// Outline width.
	pub stroke_width: f64,
	/// Defaults to the container background.
	pub stroke_color: Option<String>,
	/// Print the node balance under its id.
	pub show_balance: bool,
}

/// Width of a channel stroke: fixed, or `"auto"` to grow with capacity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStrokeWidth", into = "RawStrokeWidth")]
pub enum StrokeWidth {
	/// Same width for every channel.
	Fixed(f64),
	/// Twice the channel capacity.
	Auto,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStrokeWidth {
	Width(f64),
	Keyword(String),
}

impl TryFrom<RawStrokeWidth> for StrokeWidth {
	type Error = String;

	fn try_from(raw: RawStrokeWidth) -> Result<Self, Self::Error> {
		match raw {
			RawStrokeWidth::Width(w) => Ok(StrokeWidth::Fixed(w)),
			RawStrokeWidth::Keyword(k) if k == "auto" => Ok(StrokeWidth::Auto),
			RawStrokeWidth::Keyword(k) => Err(format!("unknown stroke width `{}`", k)),
		}
	}
}

impl From<StrokeWidth> for RawStrokeWidth {
	fn from(width: StrokeWidth) -> Self {
		match width {
			StrokeWidth::Fixed(w) => RawStrokeWidth::Width(w),
			StrokeWidth::Auto => RawStrokeWidth::Keyword("auto".into()),
		}
	}
}

impl StrokeWidth {
	/// Stroke width for a channel holding `capacity` units.
	pub fn for_capacity(self, capacity: u64) -> f64 {
		match self {
			StrokeWidth::Fixed(w) => w,
			StrokeWidth::Auto => capacity as f64 * 2.0,
		}
	}
}

/// Channel settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelOptions {
	/// Stroke color.
	pub color: String,
	/// Stroke color while highlighted.
	pub color_highlighted: String,
	/// Stroke width, a number or `"auto"`.
	pub stroke_width: StrokeWidth,
	/// Draw the `source:target` split next to each channel.
	pub show_balance: bool,
	/// Bend applied to each parallel channel between the same two nodes.
	pub parallel_bend: f64,
}

/// Bead settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BeadOptions {
	/// Bead radius in graph units.
	pub radius: f64,
	/// Gap between neighbouring beads.
	pub spacing: f64,
	/// Outline width.
	pub stroke_width: f64,
	/// Fill.
	pub color: String,
	/// Outline color.
	pub stroke_color: String,
	/// Print each bead's index next to it.
	pub show_index: bool,
	/// Duration of a single bead's trip, in milliseconds.
	pub animation_duration: f64,
	/// Extra delay per bead away from the channel boundary, in milliseconds.
	pub stagger: f64,
}

/// Parameters handed to the force simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationOptions {
	/// Repulsion between nodes.
	pub force_charge: f32,
	/// Spring pull along channels.
	pub force_spring: f32,
	/// Cap on the force applied to one node per step.
	pub force_max: f32,
	/// Velocity scale.
	pub node_speed: f32,
	/// Velocity kept between steps.
	pub damping_factor: f32,
	/// Mass of every node.
	pub node_mass: f32,
}

impl Default for ContainerOptions {
	fn default() -> Self {
		Self {
			background_color: "#FFF".into(),
		}
	}
}

impl Default for NodeOptions {
	fn default() -> Self {
		Self {
			radius: 30.0,
			color: None,
			stroke_width: 3.0,
			stroke_color: None,
			show_balance: true,
		}
	}
}

impl Default for ChannelOptions {
	fn default() -> Self {
		Self {
			color: "gray".into(),
			color_highlighted: "#ff7f0e".into(),
			stroke_width: StrokeWidth::Fixed(6.0),
			show_balance: true,
			parallel_bend: 40.0,
		}
	}
}

impl Default for BeadOptions {
	fn default() -> Self {
		Self {
			radius: 5.0,
			spacing: 1.0,
			stroke_width: 1.0,
			color: "#2ca02c".into(),
			stroke_color: "#FFF".into(),
			show_index: false,
			animation_duration: 1000.0,
			stagger: 100.0,
		}
	}
}

impl Default for SimulationOptions {
	fn default() -> Self {
		Self {
			force_charge: 2000.0,
			force_spring: 0.05,
			force_max: 280.0,
			node_speed: 7000.0,
			damping_factor: 0.9,
			node_mass: 10.0,
		}
	}
}

impl BeadnetOptions {
	/// Parse user options from JSON, keeping defaults for anything omitted.
	pub fn from_json(json: &str) -> Result<Self, OptionsError> {
		let opt: BeadnetOptions = serde_json::from_str(json)?;
		Ok(opt.resolved())
	}

	/// Fill in values derived from other settings.
	pub fn resolved(mut self) -> Self {
		if self.nodes.color.is_none() {
			self.nodes.color = Some(COLORS[0].into());
		}
		if self.nodes.stroke_color.is_none() {
			self.nodes.stroke_color = Some(self.container.background_color.clone());
		}
		self
	}

	/// Node outline color, falling back to the background.
	pub fn node_stroke_color(&self) -> &str {
		self.nodes
			.stroke_color
			.as_deref()
			.unwrap_or(&self.container.background_color)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partial_json_keeps_defaults() {
		let opt = BeadnetOptions::from_json(r#"{"beads": {"radius": 8, "stagger": 50}}"#).unwrap();
		assert_eq!(opt.beads.radius, 8.0);
		assert_eq!(opt.beads.stagger, 50.0);
		// untouched fields
		assert_eq!(opt.beads.spacing, 1.0);
		assert_eq!(opt.beads.animation_duration, 1000.0);
		assert_eq!(opt.nodes.radius, 30.0);
		assert_eq!(opt.channels.color, "gray");
	}

	#[test]
	fn test_resolved_fills_derived_colors() {
		let opt = BeadnetOptions::from_json(r##"{"container": {"backgroundColor": "#000"}}"##)
			.unwrap();
		assert_eq!(opt.nodes.stroke_color.as_deref(), Some("#000"));
		assert_eq!(opt.nodes.color.as_deref(), Some(COLORS[0]));
		assert_eq!(opt.node_stroke_color(), "#000");
	}

	#[test]
	fn test_invalid_json() {
		assert!(matches!(
			BeadnetOptions::from_json("{\"beads\": 3}"),
			Err(OptionsError::Parse(_))
		));
	}

	#[test]
	fn test_channel_stroke_width_auto() {
		let opt = BeadnetOptions::from_json(r#"{"channels": {"strokeWidth": "auto"}}"#).unwrap();
		assert_eq!(opt.channels.stroke_width, StrokeWidth::Auto);
		assert_eq!(opt.channels.stroke_width.for_capacity(5), 10.0);

		let opt = BeadnetOptions::from_json(r#"{"channels": {"strokeWidth": 4}}"#).unwrap();
		assert_eq!(opt.channels.stroke_width.for_capacity(5), 4.0);
		assert_eq!(BeadnetOptions::default().channels.stroke_width.for_capacity(1), 6.0);

		assert!(BeadnetOptions::from_json(r#"{"channels": {"strokeWidth": "wide"}}"#).is_err());
	}
}
