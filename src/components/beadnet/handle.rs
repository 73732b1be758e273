//! Shared handle to a widget instance.
//!
//! The canvas component, the page that owns it and transfer callbacks all
//! hold clones of the same [`Beadnet`]. Callbacks are run after the internal
//! borrow is released, so they may call back into the handle.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::context::{Clock, PerformanceClock};
use super::error::BeadnetError;
use super::options::BeadnetOptions;
use super::state::{BeadPlacement, BeadnetState};
use super::types::{Channel, ChannelSpec, Node, NodeSpec, Point, Side};

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;

/// Cloneable handle to one widget instance.
#[derive(Clone)]
pub struct Beadnet {
	state: Rc<RefCell<BeadnetState>>,
}

impl Beadnet {
	/// A widget driven by the browser clock.
	pub fn new(options: BeadnetOptions) -> Self {
		Self::with_clock(options, Rc::new(PerformanceClock))
	}

	/// A widget driven by `clock`, e.g. a [`ManualClock`](super::ManualClock)
	/// in tests.
	pub fn with_clock(options: BeadnetOptions, clock: Rc<dyn Clock>) -> Self {
		Self {
			state: Rc::new(RefCell::new(BeadnetState::new(
				options,
				clock,
				DEFAULT_WIDTH,
				DEFAULT_HEIGHT,
			))),
		}
	}

	pub(crate) fn state(&self) -> Ref<'_, BeadnetState> {
		self.state.borrow()
	}

	pub(crate) fn state_mut(&self) -> RefMut<'_, BeadnetState> {
		self.state.borrow_mut()
	}

	/// Add a node; ids must be unique.
	pub fn add_node(&self, node: NodeSpec) -> Result<(), BeadnetError> {
		self.state.borrow_mut().add_node(node)
	}

	/// Add several nodes, or none if any is rejected.
	pub fn add_nodes(&self, nodes: Vec<NodeSpec>) -> Result<(), BeadnetError> {
		self.state.borrow_mut().add_nodes(nodes)
	}

	/// Remove a node, closing its channels first.
	pub fn remove_node(&self, id: &str) -> Result<(), BeadnetError> {
		self.state.borrow_mut().remove_node(id)
	}

	/// Lock funds from both nodes into a new channel.
	pub fn open_channel(&self, spec: ChannelSpec) -> Result<Channel, BeadnetError> {
		self.state.borrow_mut().open_channel(&spec)
	}

	/// Open several channels, stopping at the first rejection.
	pub fn open_channels(&self, specs: Vec<ChannelSpec>) -> Result<Vec<Channel>, BeadnetError> {
		specs.into_iter().map(|spec| self.open_channel(spec)).collect()
	}

	/// Close the first channel between two nodes, in either direction,
	/// returning each side's balance to its node.
	pub fn close_channel(&self, source_id: &str, target_id: &str) -> Result<Channel, BeadnetError> {
		self.state.borrow_mut().close_channel(source_id, target_id)
	}

	/// Every channel between two nodes, in either direction.
	pub fn get_channels(&self, source_id: &str, target_id: &str) -> Vec<Channel> {
		self.state
			.borrow()
			.get_channels(source_id, target_id)
			.into_iter()
			.cloned()
			.collect()
	}

	/// Set the highlight of every channel between two nodes.
	pub fn highlight_channel(
		&self,
		source_id: &str,
		target_id: &str,
		state: bool,
	) -> Result<(), BeadnetError> {
		self.state
			.borrow_mut()
			.highlight_channel(source_id, target_id, state)
	}

	/// Flip the highlight of every channel between two nodes.
	pub fn toggle_highlight(&self, source_id: &str, target_id: &str) -> Result<(), BeadnetError> {
		self.state.borrow_mut().toggle_highlight(source_id, target_id)
	}

	/// Move `amount` units between a node and its `side` of the channel.
	/// Positive amounts deposit into the channel, negative ones withdraw.
	pub fn rebalance(
		&self,
		source_id: &str,
		target_id: &str,
		amount: i64,
		side: Side,
	) -> Result<Channel, BeadnetError> {
		self.state
			.borrow_mut()
			.rebalance(source_id, target_id, amount, side)
	}

	/// Animate `count` units from `source_id` to `target_id`.
	///
	/// `on_complete` runs once, after the last bead has arrived. Transfers on
	/// the same channel are not queued; wait for the callback before starting
	/// the next one.
	pub fn move_beads(
		&self,
		source_id: &str,
		target_id: &str,
		count: u64,
		on_complete: impl FnOnce() + 'static,
	) -> Result<(), BeadnetError> {
		self.state
			.borrow_mut()
			.move_beads(source_id, target_id, count, Some(Box::new(on_complete)))
	}

	/// Per-frame entry point: step the layout and settle finished transfers.
	pub fn tick(&self, dt: f32) {
		let finished = self.state.borrow_mut().tick(dt);
		for transfer in finished {
			if let Some(callback) = transfer.on_complete {
				callback();
			}
			self.state.borrow_mut().settle(&transfer.channel_id);
		}
	}

	/// Where every bead is drawn at the current time.
	pub fn bead_placements(&self) -> Vec<BeadPlacement> {
		self.state.borrow().bead_placements()
	}

	/// Snapshot of one node.
	pub fn node(&self, id: &str) -> Option<Node> {
		self.state.borrow().ledger.node(id).cloned()
	}

	/// Snapshot of every node, in insertion order.
	pub fn nodes(&self) -> Vec<Node> {
		self.state.borrow().ledger.nodes().cloned().collect()
	}

	/// Snapshot of every open channel, in opening order.
	pub fn channels(&self) -> Vec<Channel> {
		self.state.borrow().ledger.channels().to_vec()
	}

	/// Current layout position of a node.
	pub fn node_position(&self, id: &str) -> Option<Point> {
		self.state.borrow().node_position(id)
	}

	/// Whether any transfer is still in flight.
	pub fn is_animating(&self) -> bool {
		!self.state.borrow().animator.is_idle()
	}

	/// Pin a node for dragging.
	pub fn on_drag_start(&self, id: &str) {
		self.state.borrow_mut().on_drag_start(id);
	}

	/// Move a dragged node to graph coordinates `(x, y)`.
	pub fn on_dragged(&self, id: &str, x: f64, y: f64) {
		self.state.borrow_mut().on_dragged(id, x, y);
	}

	/// Release a dragged node back to the layout.
	pub fn on_drag_end(&self, id: &str) {
		self.state.borrow_mut().on_drag_end(id);
	}
}

impl Default for Beadnet {
	fn default() -> Self {
		Self::new(BeadnetOptions::default())
	}
}
