use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::rc::Rc;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::animator::{Animator, Completion, FinishedTransfer, Timing, select_beads};
use super::beads::BeadIndex;
use super::context::{Clock, Context};
use super::error::BeadnetError;
use super::ledger::Ledger;
use super::options::BeadnetOptions;
use super::path::RenderedPath;
use super::types::{Channel, ChannelSpec, NodeSpec, Point, Side};

/// Payload carried by each simulated node.
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node_id: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// A bead and where it should be drawn this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct BeadPlacement {
	/// Channel the bead belongs to.
	pub channel_id: String,
	/// See [`Bead::id`](super::Bead::id).
	pub bead_id: String,
	/// Slot along the channel, source beads first.
	pub index: usize,
	/// Side the bead rests on, or travels from.
	pub side: Side,
	/// 0 at its source-side slot, 1 at its target-side slot.
	pub progress: f64,
	/// Graph-space centre.
	pub point: Point,
}

/// Everything one widget instance knows: balances, beads, transfers,
/// layout and view.
pub struct BeadnetState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub ledger: Ledger,
	pub beads: BeadIndex,
	pub animator: Animator,
	pub ctx: Context,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
}

impl BeadnetState {
	pub fn new(options: BeadnetOptions, clock: Rc<dyn Clock>, width: f64, height: f64) -> Self {
		let ctx = Context::new(options, clock);
		Self {
			graph: new_simulation(&ctx.options),
			ledger: Ledger::new(),
			beads: BeadIndex::new(),
			animator: Animator::new(),
			ctx,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			animation_running: true,
		}
	}

	pub fn add_node(&mut self, spec: NodeSpec) -> Result<(), BeadnetError> {
		self.ledger.add_node(spec)?;
		self.sync_graph();
		Ok(())
	}

	pub fn add_nodes(&mut self, specs: Vec<NodeSpec>) -> Result<(), BeadnetError> {
		self.ledger.add_nodes(specs)?;
		self.sync_graph();
		Ok(())
	}

	pub fn remove_node(&mut self, id: &str) -> Result<(), BeadnetError> {
		let (_, closed) = self.ledger.remove_node(id)?;
		for ch in &closed {
			self.forget_channel(&ch.id);
		}
		if self.drag.node_id.as_deref() == Some(id) {
			self.drag = DragState::default();
		}
		self.sync_graph();
		Ok(())
	}

	pub fn open_channel(&mut self, spec: &ChannelSpec) -> Result<Channel, BeadnetError> {
		let channel = self.ledger.open_channel(spec)?;
		self.beads.rebuild(&channel);
		self.sync_graph();
		Ok(channel)
	}

	pub fn close_channel(&mut self, a: &str, b: &str) -> Result<Channel, BeadnetError> {
		let channel = self.ledger.close_channel(a, b)?;
		self.forget_channel(&channel.id);
		debug!(
			"closed {}, {} unit(s) left in the network",
			channel.id,
			self.ledger.total_funds()
		);
		self.sync_graph();
		Ok(channel)
	}

	/// Drop the beads and transfers of a closed channel. Its id may be
	/// handed out again, so nothing keyed on it may outlive it.
	fn forget_channel(&mut self, channel_id: &str) {
		self.beads.remove(channel_id);
		let cut = self.animator.cancel_channel(channel_id);
		if cut > 0 {
			debug!("{} closed with {} bead(s) in flight", channel_id, cut);
		}
	}

	pub fn get_channels(&self, a: &str, b: &str) -> Vec<&Channel> {
		self.ledger.get_channels(a, b)
	}

	pub fn highlight_channel(&mut self, a: &str, b: &str, state: bool) -> Result<(), BeadnetError> {
		self.ledger.highlight(a, b, state).map(|_| ())
	}

	pub fn toggle_highlight(&mut self, a: &str, b: &str) -> Result<(), BeadnetError> {
		self.ledger.toggle_highlight(a, b).map(|_| ())
	}

	pub fn rebalance(
		&mut self,
		a: &str,
		b: &str,
		amount: i64,
		side: Side,
	) -> Result<Channel, BeadnetError> {
		let channel = self.ledger.rebalance(a, b, amount, side)?.clone();
		self.beads.rebuild(&channel);
		Ok(channel)
	}

	/// Start moving `count` units from `source_id`'s side of the first
	/// channel between the two nodes to the other side.
	pub fn move_beads(
		&mut self,
		source_id: &str,
		target_id: &str,
		count: u64,
		on_complete: Option<Completion>,
	) -> Result<(), BeadnetError> {
		let channel = self.ledger.first_channel(source_id, target_id)?.clone();
		let from = channel
			.side_of(source_id)
			.ok_or_else(|| BeadnetError::channel_not_found(source_id, target_id))?;
		// a travelling bead keeps its side label until it lands
		let available = if self.animator.is_animating(&channel.id) {
			let travelling = self
				.animator
				.tweens()
				.iter()
				.filter(|t| t.channel_id == channel.id && t.from == from)
				.count();
			self.beads.count(&channel.id, from).saturating_sub(travelling) as u64
		} else {
			channel.balance(from)
		};
		if count > available {
			return Err(BeadnetError::InsufficientBalance {
				holder: format!("{} side of {}", from.as_str(), channel.id),
				available,
				requested: count,
			});
		}

		if !self.animator.is_animating(&channel.id) {
			self.beads.rebuild(&channel);
		}
		let busy = self.animator.in_flight(&channel.id);
		let selection = select_beads(self.beads.beads(&channel.id), from, count, &busy);
		let opt = &self.ctx.options.beads;
		let timing = Timing {
			now: self.ctx.now(),
			duration: opt.animation_duration,
			stagger: opt.stagger,
		};
		self.animator.start(
			&channel.id,
			self.beads.beads(&channel.id),
			&selection,
			from,
			timing,
			on_complete,
		);
		info!(
			"moving {} bead(s) on {} from {} side",
			count,
			channel.id,
			from.as_str()
		);
		Ok(())
	}

	/// Advance the simulation by `dt` seconds and settle arrived beads.
	pub fn tick(&mut self, dt: f32) -> Vec<FinishedTransfer> {
		if self.animation_running {
			self.graph.update(dt);
		}
		self.advance_transfers()
	}

	/// Commit every bead that reached the far side since the last call.
	///
	/// Returned transfers still need their callback run and then
	/// [`Self::settle`] called for their channel.
	pub fn advance_transfers(&mut self) -> Vec<FinishedTransfer> {
		let poll = self.animator.poll(self.ctx.now());
		for arrival in poll.arrivals {
			match self.ledger.transfer_unit(&arrival.channel_id, arrival.from) {
				Ok(_) => self.beads.flip(
					&arrival.channel_id,
					arrival.index,
					arrival.from.opposite(),
				),
				Err(e) => debug!("dropping bead arrival: {}", e),
			}
		}
		poll.finished
	}

	/// Re-derive a channel's beads once its transfer is over.
	pub fn settle(&mut self, channel_id: &str) {
		if self.animator.is_animating(channel_id) {
			return;
		}
		if let Some(channel) = self.ledger.channel(channel_id) {
			self.beads.rebuild(channel);
		}
	}

	pub fn node_positions(&self) -> HashMap<String, Point> {
		let mut positions = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.id.clone(),
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		positions
	}

	pub fn node_position(&self, id: &str) -> Option<Point> {
		self.node_positions().remove(id)
	}

	/// The path of every channel whose endpoints are laid out.
	///
	/// Parallel channels between the same two nodes fan out as curves.
	pub fn channel_paths(&self) -> Vec<(&Channel, RenderedPath)> {
		let positions = self.node_positions();
		let channels = self.ledger.channels();

		let mut totals: HashMap<(&str, &str), usize> = HashMap::new();
		for ch in channels {
			*totals.entry(pair_key(ch)).or_default() += 1;
		}
		let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
		let bend = self.ctx.options.channels.parallel_bend;

		channels
			.iter()
			.filter_map(|ch| {
				let key = pair_key(ch);
				let slot = seen.entry(key).or_default();
				let k = *slot as f64;
				*slot += 1;
				let (from, to) = (positions.get(&ch.source)?, positions.get(&ch.target)?);
				let n = totals.get(&key).copied().unwrap_or(1) as f64;
				let mut offset = bend * (k - (n - 1.0) / 2.0);
				// keep the fan on the same side whichever way a channel points
				if ch.source.as_str() != key.0 {
					offset = -offset;
				}
				Some((ch, RenderedPath::between(*from, *to, offset)))
			})
			.collect()
	}

	/// Where every live bead sits right now.
	pub fn bead_placements(&self) -> Vec<BeadPlacement> {
		let geometry = self.ctx.geometry();
		let now = self.ctx.now();
		let mut placements = Vec::new();
		for (channel, path) in self.channel_paths() {
			let beads = self.beads.beads(&channel.id);
			for bead in beads {
				let progress = self
					.animator
					.progress(&channel.id, &bead.id, now)
					.unwrap_or_else(|| bead.side.resting_progress());
				placements.push(BeadPlacement {
					channel_id: channel.id.clone(),
					bead_id: bead.id.clone(),
					index: bead.index,
					side: bead.side,
					progress,
					point: geometry.position(&path, bead.index, beads.len(), progress),
				});
			}
		}
		placements
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let radius = self.ctx.options.nodes.radius;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < radius {
				found = Some(node.data.user_data.id.clone());
			}
		});
		found
	}

	/// Pin a node where it is.
	pub fn on_drag_start(&mut self, id: &str) {
		if let Some(p) = self.node_position(id) {
			self.drag.node_id = Some(id.to_string());
			self.drag.node_start_x = p.x;
			self.drag.node_start_y = p.y;
			self.pin(id, p.x, p.y);
		}
	}

	/// Move a pinned node to graph coordinates `(x, y)`.
	pub fn on_dragged(&mut self, id: &str, x: f64, y: f64) {
		self.pin(id, x, y);
	}

	/// Hand the node back to the simulation.
	pub fn on_drag_end(&mut self, id: &str) {
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data.id == id {
				node.data.is_anchor = false;
			}
		});
		self.drag = DragState::default();
	}

	fn pin(&mut self, id: &str, x: f64, y: f64) {
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data.id == id {
				node.data.x = x as f32;
				node.data.y = y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.transform.k * factor).clamp(0.1, 5.0);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Rebuild the simulation from the ledger, keeping known positions.
	fn sync_graph(&mut self) {
		let mut known: HashMap<String, (f32, f32, bool)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			known.insert(
				node.data.user_data.id.clone(),
				(node.x(), node.y(), node.data.is_anchor),
			);
		});

		let opt = &self.ctx.options;
		let mut graph = new_simulation(opt);
		let mut id_to_idx = HashMap::new();
		let count = self.ledger.node_count().max(1);
		let spread = opt.nodes.radius * 4.0;

		for (i, node) in self.ledger.nodes().enumerate() {
			let (x, y, is_anchor) = known.get(&node.id).copied().unwrap_or_else(|| {
				let angle = (i as f64) * 2.0 * PI / count as f64;
				(
					(spread * angle.cos()) as f32,
					(spread * angle.sin()) as f32,
					false,
				)
			});
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: opt.simulation.node_mass,
				is_anchor,
				user_data: NodeInfo {
					id: node.id.clone(),
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
		}

		let mut linked = HashSet::new();
		for ch in self.ledger.channels() {
			if !linked.insert(pair_key(ch)) {
				continue;
			}
			if let (Some(&src), Some(&tgt)) = (id_to_idx.get(&ch.source), id_to_idx.get(&ch.target)) {
				graph.add_edge(src, tgt, EdgeData::default());
			}
		}
		self.graph = graph;
	}
}

fn new_simulation(opt: &BeadnetOptions) -> ForceGraph<NodeInfo, ()> {
	let sim = &opt.simulation;
	ForceGraph::new(SimulationParameters {
		force_charge: sim.force_charge,
		force_spring: sim.force_spring,
		force_max: sim.force_max,
		node_speed: sim.node_speed,
		damping_factor: sim.damping_factor,
	})
}

/// Unordered endpoint pair of a channel.
fn pair_key(ch: &Channel) -> (&str, &str) {
	if ch.source <= ch.target {
		(&ch.source, &ch.target)
	} else {
		(&ch.target, &ch.source)
	}
}
