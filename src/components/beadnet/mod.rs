//! Payment-channel network widget: ledger, beads, placement and animation.

mod animator;
mod beads;
mod component;
mod context;
mod error;
mod handle;
mod ledger;
mod options;
mod path;
mod render;
mod state;
mod types;

pub use beads::{Bead, derive_beads};
pub use component::BeadnetCanvas;
pub use context::{Clock, ManualClock, PerformanceClock};
pub use error::BeadnetError;
pub use handle::Beadnet;
pub use options::{
	BeadOptions, BeadnetOptions, COLORS, ChannelOptions, ContainerOptions, NodeOptions,
	OptionsError, SimulationOptions, StrokeWidth,
};
pub use path::{BeadGeometry, ChannelPath, CurvePath, LinePath, RenderedPath};
pub use state::BeadPlacement;
pub use types::{Channel, ChannelSpec, Node, NodeSpec, Point, Side};
