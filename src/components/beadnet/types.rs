use serde::{Deserialize, Serialize};

/// Which end of a channel a unit of balance is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	/// Held by the channel's source node.
	Source,
	/// Held by the channel's target node.
	Target,
}

impl Side {
	/// Animation progress at which a bead of this side rests.
	pub fn resting_progress(self) -> f64 {
		match self {
			Side::Source => 0.0,
			Side::Target => 1.0,
		}
	}

	/// The other end of the channel.
	pub fn opposite(self) -> Side {
		match self {
			Side::Source => Side::Target,
			Side::Target => Side::Source,
		}
	}

	/// Lowercase name, as used in bead ids.
	pub fn as_str(self) -> &'static str {
		match self {
			Side::Source => "source",
			Side::Target => "target",
		}
	}
}

/// An account holding a free balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
	/// Unique name, also the label.
	pub id: String,
	/// Funds not locked in any channel.
	pub balance: u64,
	/// Fill color.
	pub color: String,
}

/// Caller-facing description of a node to add.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeSpec {
	/// Unique name.
	pub id: String,
	/// Starting free balance.
	pub balance: u64,
	/// Fill color; `None` takes the next palette color.
	#[serde(default)]
	pub color: Option<String>,
}

impl NodeSpec {
	/// A node with a palette color.
	pub fn new(id: impl Into<String>, balance: u64) -> Self {
		Self {
			id: id.into(),
			balance,
			color: None,
		}
	}
}

/// A bilateral split of funds between two nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
	/// Derived from the endpoints and capacity, unique among open channels.
	pub id: String,
	/// Node that opened the channel.
	pub source: String,
	/// Counterparty.
	pub target: String,
	/// Units on the source side.
	pub source_balance: u64,
	/// Units on the target side.
	pub target_balance: u64,
	/// Drawn with the highlight color.
	pub highlighted: bool,
}

impl Channel {
	/// Total units locked in the channel.
	pub fn capacity(&self) -> u64 {
		self.source_balance + self.target_balance
	}

	/// Units held on `side`.
	pub fn balance(&self, side: Side) -> u64 {
		match side {
			Side::Source => self.source_balance,
			Side::Target => self.target_balance,
		}
	}

	/// Node at the `side` end.
	pub fn node_id(&self, side: Side) -> &str {
		match side {
			Side::Source => &self.source,
			Side::Target => &self.target,
		}
	}

	/// Whether this channel connects `a` and `b`, in either direction.
	pub fn connects(&self, a: &str, b: &str) -> bool {
		(self.source == a && self.target == b) || (self.source == b && self.target == a)
	}

	/// Side of this channel held by `node_id`, if it is an endpoint.
	pub fn side_of(&self, node_id: &str) -> Option<Side> {
		if self.source == node_id {
			Some(Side::Source)
		} else if self.target == node_id {
			Some(Side::Target)
		} else {
			None
		}
	}
}

/// Caller-facing request to open a channel.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
	/// Opening node.
	pub source: String,
	/// Counterparty.
	pub target: String,
	/// Funds the source locks in.
	#[serde(default)]
	pub source_balance: u64,
	/// Funds the target locks in.
	#[serde(default)]
	pub target_balance: u64,
}

impl ChannelSpec {
	/// A request funded by both sides.
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		source_balance: u64,
		target_balance: u64,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			source_balance,
			target_balance,
		}
	}
}

/// A point in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal, growing rightwards.
	pub x: f64,
	/// Vertical, growing downwards.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}

	/// Point a fraction `t` of the way to `other`.
	pub fn lerp(self, other: Point, t: f64) -> Point {
		Point::new(
			self.x + (other.x - self.x) * t,
			self.y + (other.y - self.y) * t,
		)
	}
}
