//! End-to-end checks of the widget API with a hand-driven clock.

use std::cell::Cell;
use std::rc::Rc;

use beadnet::{
	BeadGeometry, Beadnet, BeadnetError, BeadnetOptions, ChannelPath, ChannelSpec, LinePath,
	ManualClock, NodeSpec, Point, Side, derive_beads,
};

fn network() -> (Beadnet, ManualClock) {
	let clock = ManualClock::new(0.0);
	let beadnet = Beadnet::with_clock(BeadnetOptions::default(), Rc::new(clock.clone()));
	beadnet
		.add_nodes(vec![
			NodeSpec::new("alice", 10),
			NodeSpec::new("bob", 10),
			NodeSpec::new("carol", 10),
		])
		.unwrap();
	(beadnet, clock)
}

fn balances(beadnet: &Beadnet, a: &str, b: &str) -> (u64, u64) {
	let ch = &beadnet.get_channels(a, b)[0];
	(ch.source_balance, ch.target_balance)
}

#[test]
fn open_channel_moves_funds_out_of_nodes() {
	let (beadnet, _) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();
	assert_eq!(beadnet.node("alice").unwrap().balance, 7);
	assert_eq!(beadnet.node("bob").unwrap().balance, 8);
	assert_eq!(beadnet.channels()[0].capacity(), 5);
}

#[test]
fn zero_funded_channel_is_invalid() {
	let (beadnet, _) = network();
	let err = beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 0, 0))
		.unwrap_err();
	assert!(matches!(err, BeadnetError::InvalidChannel { .. }));
	assert!(beadnet.channels().is_empty());
}

#[test]
fn move_beads_settles_and_calls_back_once() {
	let (beadnet, clock) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();

	let calls = Rc::new(Cell::new(0));
	let seen = calls.clone();
	beadnet
		.move_beads("alice", "bob", 2, move || seen.set(seen.get() + 1))
		.unwrap();

	// first bead lands, second is still halfway through its delay + trip
	clock.set(1000.0);
	beadnet.tick(0.0);
	assert_eq!(balances(&beadnet, "alice", "bob"), (2, 3));
	assert_eq!(calls.get(), 0);

	clock.set(1099.0);
	beadnet.tick(0.0);
	assert_eq!(calls.get(), 0);

	clock.set(1100.0);
	beadnet.tick(0.0);
	assert_eq!(balances(&beadnet, "alice", "bob"), (1, 4));
	assert_eq!(calls.get(), 1);

	clock.set(5000.0);
	beadnet.tick(0.0);
	assert_eq!(calls.get(), 1);
	assert!(!beadnet.is_animating());

	let placements = beadnet.bead_placements();
	assert_eq!(placements.len(), 5);
	assert_eq!(
		placements.iter().filter(|p| p.side == Side::Target).count(),
		4
	);
}

#[test]
fn callback_may_chain_another_transfer() {
	let (beadnet, clock) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 2, 0))
		.unwrap();

	let chained = beadnet.clone();
	beadnet
		.move_beads("alice", "bob", 2, move || {
			chained.move_beads("bob", "alice", 1, || {}).unwrap();
		})
		.unwrap();

	clock.set(1100.0);
	beadnet.tick(0.0);
	assert_eq!(balances(&beadnet, "alice", "bob"), (0, 2));
	assert!(beadnet.is_animating());

	clock.set(2100.0);
	beadnet.tick(0.0);
	assert_eq!(balances(&beadnet, "alice", "bob"), (1, 1));
	assert!(!beadnet.is_animating());
}

#[test]
fn overdrawn_transfer_changes_nothing() {
	let (beadnet, _) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();
	let err = beadnet.move_beads("alice", "bob", 4, || {}).unwrap_err();
	assert!(matches!(
		err,
		BeadnetError::InsufficientBalance {
			available: 3,
			requested: 4,
			..
		}
	));
	assert_eq!(balances(&beadnet, "alice", "bob"), (3, 2));
	assert!(!beadnet.is_animating());
}

#[test]
fn closing_mid_flight_is_harmless() {
	let (beadnet, clock) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();
	let calls = Rc::new(Cell::new(0));
	let seen = calls.clone();
	beadnet
		.move_beads("alice", "bob", 3, move || seen.set(seen.get() + 1))
		.unwrap();

	clock.set(1000.0);
	beadnet.tick(0.0);
	let closed = beadnet.close_channel("bob", "alice").unwrap();
	assert_eq!((closed.source_balance, closed.target_balance), (2, 3));

	clock.set(5000.0);
	beadnet.tick(0.0);
	assert_eq!(calls.get(), 1);
	assert_eq!(beadnet.node("alice").unwrap().balance, 9);
	assert_eq!(beadnet.node("bob").unwrap().balance, 11);
	assert!(beadnet.bead_placements().is_empty());
}

#[test]
fn funds_are_conserved() {
	let (beadnet, clock) = network();
	let total = || {
		beadnet.nodes().iter().map(|n| n.balance).sum::<u64>()
			+ beadnet.channels().iter().map(|c| c.capacity()).sum::<u64>()
	};
	let start = total();
	beadnet
		.open_channel(ChannelSpec::new("alice", "carol", 4, 4))
		.unwrap();
	beadnet.rebalance("carol", "alice", 3, Side::Target).unwrap();
	beadnet.move_beads("carol", "alice", 5, || {}).unwrap();
	clock.set(10_000.0);
	beadnet.tick(0.0);
	beadnet.rebalance("alice", "carol", -2, Side::Source).unwrap();
	assert_eq!(total(), start);
	assert_eq!(balances(&beadnet, "alice", "carol"), (7, 2));
}

#[test]
fn remove_node_refunds_counterparty() {
	let (beadnet, _) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();
	beadnet.remove_node("alice").unwrap();
	assert!(beadnet.node("alice").is_none());
	assert_eq!(beadnet.node("bob").unwrap().balance, 10);
	assert!(beadnet.channels().is_empty());
	assert_eq!(
		beadnet.remove_node("alice"),
		Err(BeadnetError::NodeNotFound("alice".into()))
	);
}

#[test]
fn highlight_requires_a_channel() {
	let (beadnet, _) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 1, 0))
		.unwrap();
	beadnet.highlight_channel("bob", "alice", true).unwrap();
	assert!(beadnet.channels()[0].highlighted);
	assert!(matches!(
		beadnet.highlight_channel("alice", "carol", true),
		Err(BeadnetError::ChannelNotFound { .. })
	));
}

#[test]
fn resting_points_are_mirrored() {
	let geometry = BeadGeometry::from_options(&BeadnetOptions::default());
	let path = LinePath {
		from: Point::new(0.0, 0.0),
		to: Point::new(0.0, 500.0),
	};
	let ch = beadnet::Channel {
		id: "c".into(),
		source: "a".into(),
		target: "b".into(),
		source_balance: 3,
		target_balance: 2,
		highlighted: false,
	};
	let beads = derive_beads(&ch);
	let pad = geometry.channel_padding();
	let step = geometry.distance_between_beads();
	for bead in &beads {
		let at_source = geometry.position(&path, bead.index, beads.len(), 0.0);
		let expected = path.point_at_length(pad + bead.index as f64 * step);
		assert!((at_source.y - expected.y).abs() < 1e-9);

		let at_target = geometry.position(&path, bead.index, beads.len(), 1.0);
		let mirrored = path.total_length() - pad - (beads.len() - 1 - bead.index) as f64 * step;
		assert!((at_target.y - mirrored).abs() < 1e-9);
	}
}

#[test]
fn reopened_channel_keeps_its_own_split() {
	let (beadnet, clock) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();
	let calls = Rc::new(Cell::new(0));
	let seen = calls.clone();
	beadnet
		.move_beads("alice", "bob", 3, move || seen.set(seen.get() + 1))
		.unwrap();
	beadnet.close_channel("alice", "bob").unwrap();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();

	clock.set(500.0);
	beadnet.tick(0.0);
	assert!(
		beadnet
			.bead_placements()
			.iter()
			.all(|p| p.progress == p.side.resting_progress())
	);

	clock.set(5000.0);
	beadnet.tick(0.0);
	assert_eq!(balances(&beadnet, "alice", "bob"), (3, 2));
	assert_eq!(calls.get(), 1);
	assert!(!beadnet.is_animating());
}

#[test]
fn second_transfer_cannot_spend_moving_beads() {
	let (beadnet, clock) = network();
	beadnet
		.open_channel(ChannelSpec::new("alice", "bob", 3, 2))
		.unwrap();
	beadnet.move_beads("alice", "bob", 3, || {}).unwrap();
	let err = beadnet.move_beads("alice", "bob", 3, || {}).unwrap_err();
	assert!(matches!(
		err,
		BeadnetError::InsufficientBalance {
			available: 0,
			requested: 3,
			..
		}
	));

	clock.set(5000.0);
	beadnet.tick(0.0);
	assert_eq!(balances(&beadnet, "alice", "bob"), (0, 5));
}
