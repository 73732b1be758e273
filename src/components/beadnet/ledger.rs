//! Node balances and channel splits.
//!
//! Every mutating operation validates all of its preconditions before
//! touching any balance, so a rejected call leaves the ledger unchanged.

use std::collections::HashMap;

use log::{debug, info};

use super::error::BeadnetError;
use super::options::COLORS;
use super::types::{Channel, ChannelSpec, Node, NodeSpec, Side};

/// Sole owner of node balances and channel splits.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
	nodes: HashMap<String, Node>,
	node_order: Vec<String>,
	/// Creation order; "first channel between a and b" follows it.
	channels: Vec<Channel>,
}

impl Ledger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.node_order.iter().filter_map(|id| self.nodes.get(id))
	}

	pub fn node_count(&self) -> usize {
		self.node_order.len()
	}

	pub fn channel(&self, id: &str) -> Option<&Channel> {
		self.channels.iter().find(|ch| ch.id == id)
	}

	pub fn channels(&self) -> &[Channel] {
		&self.channels
	}

	/// Free balances plus every channel's capacity.
	pub fn total_funds(&self) -> u64 {
		self.nodes.values().map(|n| n.balance).sum::<u64>()
			+ self.channels.iter().map(Channel::capacity).sum::<u64>()
	}

	pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node, BeadnetError> {
		if self.nodes.contains_key(&spec.id) {
			return Err(BeadnetError::DuplicateNode(spec.id));
		}
		let color = spec
			.color
			.unwrap_or_else(|| COLORS[(self.node_order.len() + 1) % COLORS.len()].into());
		let id = spec.id;
		debug!("add node {} with balance {}", id, spec.balance);
		self.node_order.push(id.clone());
		let node = self.nodes.entry(id.clone()).or_insert(Node {
			id,
			balance: spec.balance,
			color,
		});
		Ok(&*node)
	}

	/// Add several nodes; nothing is inserted if any id is taken.
	pub fn add_nodes(&mut self, specs: Vec<NodeSpec>) -> Result<(), BeadnetError> {
		let mut seen = std::collections::HashSet::new();
		for spec in &specs {
			if self.nodes.contains_key(&spec.id) || !seen.insert(spec.id.as_str()) {
				return Err(BeadnetError::DuplicateNode(spec.id.clone()));
			}
		}
		for spec in specs {
			self.add_node(spec)?;
		}
		Ok(())
	}

	/// Remove a node, closing every channel attached to it first.
	///
	/// Returns the removed node and the channels that were closed.
	pub fn remove_node(&mut self, id: &str) -> Result<(Node, Vec<Channel>), BeadnetError> {
		if !self.nodes.contains_key(id) {
			return Err(BeadnetError::NodeNotFound(id.to_string()));
		}
		let (attached, kept): (Vec<Channel>, Vec<Channel>) = std::mem::take(&mut self.channels)
			.into_iter()
			.partition(|ch| ch.source == id || ch.target == id);
		self.channels = kept;
		for ch in &attached {
			self.credit(&ch.source, ch.source_balance);
			self.credit(&ch.target, ch.target_balance);
		}
		self.node_order.retain(|n| n != id);
		let node = self
			.nodes
			.remove(id)
			.ok_or_else(|| BeadnetError::NodeNotFound(id.to_string()))?;
		info!(
			"removed node {} and closed {} channel(s)",
			node.id,
			attached.len()
		);
		Ok((node, attached))
	}

	pub fn open_channel(&mut self, spec: &ChannelSpec) -> Result<Channel, BeadnetError> {
		if spec.source_balance == 0 && spec.target_balance == 0 {
			return Err(BeadnetError::InvalidChannel {
				from: spec.source.clone(),
				to: spec.target.clone(),
			});
		}
		if spec.source == spec.target {
			return Err(BeadnetError::SelfChannel {
				node_id: spec.source.clone(),
			});
		}
		let source = self.require_node(&spec.source)?;
		let target = self.require_node(&spec.target)?;
		if source.balance < spec.source_balance {
			return Err(BeadnetError::InsufficientBalance {
				holder: format!("node `{}`", source.id),
				available: source.balance,
				requested: spec.source_balance,
			});
		}
		if target.balance < spec.target_balance {
			return Err(BeadnetError::InsufficientBalance {
				holder: format!("node `{}`", target.id),
				available: target.balance,
				requested: spec.target_balance,
			});
		}

		self.debit(&spec.source, spec.source_balance);
		self.debit(&spec.target, spec.target_balance);

		let channel = Channel {
			id: self.unique_channel_id(spec),
			source: spec.source.clone(),
			target: spec.target.clone(),
			source_balance: spec.source_balance,
			target_balance: spec.target_balance,
			highlighted: false,
		};
		info!(
			"opened {} ({}:{})",
			channel.id, channel.source_balance, channel.target_balance
		);
		self.channels.push(channel.clone());
		Ok(channel)
	}

	/// Close the first channel between `a` and `b` and refund both ends.
	pub fn close_channel(&mut self, a: &str, b: &str) -> Result<Channel, BeadnetError> {
		let pos = self
			.channels
			.iter()
			.position(|ch| ch.connects(a, b))
			.ok_or_else(|| BeadnetError::channel_not_found(a, b))?;
		let channel = self.channels.remove(pos);
		self.credit(&channel.source, channel.source_balance);
		self.credit(&channel.target, channel.target_balance);
		info!("closed {}", channel.id);
		Ok(channel)
	}

	/// Every channel connecting `a` and `b`, in either direction.
	pub fn get_channels(&self, a: &str, b: &str) -> Vec<&Channel> {
		self.channels.iter().filter(|ch| ch.connects(a, b)).collect()
	}

	pub fn first_channel(&self, a: &str, b: &str) -> Result<&Channel, BeadnetError> {
		self.channels
			.iter()
			.find(|ch| ch.connects(a, b))
			.ok_or_else(|| BeadnetError::channel_not_found(a, b))
	}

	/// Move `amount` between the free balance of the node on `side` and that
	/// side of the first channel between `a` and `b`.
	///
	/// Positive amounts fund the channel, negative amounts refund the node.
	pub fn rebalance(
		&mut self,
		a: &str,
		b: &str,
		amount: i64,
		side: Side,
	) -> Result<&Channel, BeadnetError> {
		let pos = self
			.channels
			.iter()
			.position(|ch| ch.connects(a, b))
			.ok_or_else(|| BeadnetError::channel_not_found(a, b))?;
		let node_id = self.channels[pos].node_id(side).to_string();
		let node_balance = self.require_node(&node_id)?.balance;
		let magnitude = amount.unsigned_abs();

		if amount > 0 && node_balance < magnitude {
			return Err(BeadnetError::InsufficientBalance {
				holder: format!("node `{}`", node_id),
				available: node_balance,
				requested: magnitude,
			});
		}
		let side_balance = self.channels[pos].balance(side);
		if amount < 0 && side_balance < magnitude {
			return Err(BeadnetError::InsufficientBalance {
				holder: format!("{} side of {}", side.as_str(), self.channels[pos].id),
				available: side_balance,
				requested: magnitude,
			});
		}

		if amount > 0 {
			self.debit(&node_id, magnitude);
			*side_slot(&mut self.channels[pos], side) += magnitude;
		} else if amount < 0 {
			self.credit(&node_id, magnitude);
			*side_slot(&mut self.channels[pos], side) -= magnitude;
		}
		let channel = &self.channels[pos];
		debug!(
			"rebalanced {} by {} on {} side ({}:{})",
			channel.id,
			amount,
			side.as_str(),
			channel.source_balance,
			channel.target_balance
		);
		Ok(channel)
	}

	/// Move a single unit across a channel. Used when a bead arrives.
	pub fn transfer_unit(&mut self, channel_id: &str, from: Side) -> Result<&Channel, BeadnetError> {
		let channel = self
			.channels
			.iter_mut()
			.find(|ch| ch.id == channel_id)
			.ok_or_else(|| BeadnetError::UnknownChannel(channel_id.to_string()))?;
		if channel.balance(from) == 0 {
			return Err(BeadnetError::InsufficientBalance {
				holder: format!("{} side of {}", from.as_str(), channel.id),
				available: 0,
				requested: 1,
			});
		}
		*side_slot(channel, from) -= 1;
		*side_slot(channel, from.opposite()) += 1;
		Ok(&*channel)
	}

	/// Set the highlight flag on every channel between `a` and `b`.
	pub fn highlight(&mut self, a: &str, b: &str, state: bool) -> Result<Vec<String>, BeadnetError> {
		self.update_highlight(a, b, |_| state)
	}

	pub fn toggle_highlight(&mut self, a: &str, b: &str) -> Result<Vec<String>, BeadnetError> {
		self.update_highlight(a, b, |current| !current)
	}

	fn update_highlight(
		&mut self,
		a: &str,
		b: &str,
		f: impl Fn(bool) -> bool,
	) -> Result<Vec<String>, BeadnetError> {
		let mut touched = Vec::new();
		for ch in self.channels.iter_mut().filter(|ch| ch.connects(a, b)) {
			ch.highlighted = f(ch.highlighted);
			touched.push(ch.id.clone());
		}
		if touched.is_empty() {
			return Err(BeadnetError::channel_not_found(a, b));
		}
		Ok(touched)
	}

	fn unique_channel_id(&self, spec: &ChannelSpec) -> String {
		let capacity = spec.source_balance + spec.target_balance;
		let base = format!("channel{}{}{}", spec.source, capacity, spec.target);
		let mut id = base.clone();
		let mut nonce = 0;
		while self.channels.iter().any(|ch| ch.id == id) {
			nonce += 1;
			id = format!("{}{}", base, nonce);
		}
		id
	}

	fn require_node(&self, id: &str) -> Result<&Node, BeadnetError> {
		self.nodes
			.get(id)
			.ok_or_else(|| BeadnetError::NodeNotFound(id.to_string()))
	}

	fn debit(&mut self, id: &str, amount: u64) {
		if let Some(node) = self.nodes.get_mut(id) {
			node.balance -= amount;
		}
	}

	fn credit(&mut self, id: &str, amount: u64) {
		if let Some(node) = self.nodes.get_mut(id) {
			node.balance += amount;
		}
	}
}

fn side_slot(channel: &mut Channel, side: Side) -> &mut u64 {
	match side {
		Side::Source => &mut channel.source_balance,
		Side::Target => &mut channel.target_balance,
	}
}
