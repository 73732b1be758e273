use thiserror::Error;

/// Why a widget operation was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BeadnetError {
	/// A channel was requested with no funds on either side.
	#[error("channel between `{from}` and `{to}` must carry funds")]
	InvalidChannel {
		/// Requested source node.
		from: String,
		/// Requested target node.
		to: String,
	},

	/// Both endpoints of a requested channel are the same node.
	#[error("cannot open a channel from `{node_id}` to itself")]
	SelfChannel {
		/// The node named twice.
		node_id: String,
	},

	/// A node or channel side cannot cover the requested amount.
	#[error("{holder} has an insufficient balance of {available} for {requested}")]
	InsufficientBalance {
		/// Node id, or the side of a channel, that was short.
		holder: String,
		/// Units it could spend.
		available: u64,
		/// Units asked for.
		requested: u64,
	},

	/// No open channel connects the two nodes, in either direction.
	#[error("no channel found between `{from}` and `{to}`")]
	ChannelNotFound {
		/// First node named.
		from: String,
		/// Second node named.
		to: String,
	},

	/// A channel id that is not (or no longer) open.
	#[error("channel `{0}` not found")]
	UnknownChannel(String),

	/// No node with this id.
	#[error("node `{0}` not found")]
	NodeNotFound(String),

	/// A node with this id is already in the network.
	#[error("node `{0}` already exists")]
	DuplicateNode(String),
}

impl BeadnetError {
	pub(crate) fn channel_not_found(from: &str, to: &str) -> Self {
		BeadnetError::ChannelNotFound {
			from: from.to_string(),
			to: to.to_string(),
		}
	}
}
