//! Unit tokens ("beads") derived from a channel's split.

use std::collections::HashMap;

use super::types::{Channel, Side};

/// One indivisible unit of a channel's capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bead {
	/// Stable while the channel split is unchanged.
	pub id: String,
	/// Side the bead currently rests on.
	pub side: Side,
	/// Position along the channel, source beads first.
	pub index: usize,
}

/// Derive the beads of a channel from its current split.
///
/// Ids only depend on the channel id and the split, so re-deriving an
/// unchanged channel yields the same ids and any transfer yields new ones.
pub fn derive_beads(channel: &Channel) -> Vec<Bead> {
	let (sb, tb) = (channel.source_balance, channel.target_balance);
	let source = (0..sb).map(|slot| (Side::Source, slot));
	let target = (0..tb).map(|slot| (Side::Target, slot));
	source
		.chain(target)
		.enumerate()
		.map(|(index, (side, slot))| Bead {
			id: format!("bead_{}_{}_{}_{}x{}", channel.id, side.as_str(), slot, sb, tb),
			side,
			index,
		})
		.collect()
}

/// Derived beads of every channel, keyed by channel id.
#[derive(Clone, Debug, Default)]
pub struct BeadIndex {
	beads: HashMap<String, Vec<Bead>>,
}

impl BeadIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn rebuild(&mut self, channel: &Channel) {
		self.beads.insert(channel.id.clone(), derive_beads(channel));
	}

	pub fn remove(&mut self, channel_id: &str) {
		self.beads.remove(channel_id);
	}

	pub fn beads(&self, channel_id: &str) -> &[Bead] {
		self.beads.get(channel_id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Relabel a single bead after it arrived on the other side.
	pub fn flip(&mut self, channel_id: &str, index: usize, side: Side) {
		if let Some(bead) = self
			.beads
			.get_mut(channel_id)
			.and_then(|beads| beads.get_mut(index))
		{
			bead.side = side;
		}
	}

	/// Beads of a channel currently labelled `side`.
	pub fn count(&self, channel_id: &str, side: Side) -> usize {
		self.beads(channel_id)
			.iter()
			.filter(|b| b.side == side)
			.count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn channel(sb: u64, tb: u64) -> Channel {
		Channel {
			id: "channela5b".into(),
			source: "a".into(),
			target: "b".into(),
			source_balance: sb,
			target_balance: tb,
			highlighted: false,
		}
	}

	#[test]
	fn test_three_two_split() {
		let beads = derive_beads(&channel(3, 2));
		assert_eq!(beads.len(), 5);
		for (i, bead) in beads.iter().enumerate() {
			assert_eq!(bead.index, i);
			let expected = if i < 3 { Side::Source } else { Side::Target };
			assert_eq!(bead.side, expected);
		}
		assert_eq!(beads[0].id, "bead_channela5b_source_0_3x2");
		assert_eq!(beads[3].id, "bead_channela5b_target_0_3x2");
	}

	#[test]
	fn test_ids_are_stable_for_same_split() {
		assert_eq!(derive_beads(&channel(3, 2)), derive_beads(&channel(3, 2)));
	}

	#[test]
	fn test_split_change_renews_every_id() {
		let before = derive_beads(&channel(3, 2));
		let after = derive_beads(&channel(2, 3));
		assert!(after.iter().all(|b| before.iter().all(|o| o.id != b.id)));
	}

	#[test]
	fn test_index_flip_and_counts() {
		let mut index = BeadIndex::new();
		let ch = channel(3, 2);
		index.rebuild(&ch);
		index.flip(&ch.id, 2, Side::Target);
		assert_eq!(index.count(&ch.id, Side::Source), 2);
		assert_eq!(index.count(&ch.id, Side::Target), 3);
		// out of range is ignored
		index.flip(&ch.id, 99, Side::Target);
		index.remove(&ch.id);
		assert!(index.beads(&ch.id).is_empty());
	}
}
