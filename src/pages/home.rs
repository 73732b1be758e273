use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};

use crate::components::beadnet::{Beadnet, BeadnetCanvas, BeadnetOptions, ChannelSpec, NodeSpec};

const NAMES: &[&str] = &[
	"Lester", "Margot", "Abdul", "Avery", "Clara", "Ewald", "Kendall", "Leda", "Dawn", "Quinn",
	"Dane", "Buster", "Carlee", "Maud", "Jacey", "Samara", "Alene", "Kaylin", "Hubert", "Al",
	"Franco", "Mervin", "Neha", "Kole", "Candida", "Enoch", "Pansy", "Ryder", "Mabel", "Tavares",
];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Deterministic dice for the demo.
struct Dice {
	seed: usize,
}

impl Dice {
	fn new(seed: usize) -> Self {
		Self { seed }
	}

	/// A number in `0..max`.
	fn roll(&mut self, max: usize) -> usize {
		self.seed = (self.seed * 7919 + 104_729) % 233_280;
		((rand_simple(self.seed) * max as f64) as usize).min(max.saturating_sub(1))
	}
}

/// Nodes with unique names and a balance below 100.
fn random_nodes(dice: &mut Dice, count: usize) -> Vec<NodeSpec> {
	let mut taken: Vec<String> = Vec::new();
	(0..count)
		.map(|_| {
			let base = NAMES[dice.roll(NAMES.len())];
			let mut name = base.to_string();
			let mut n = 1;
			while taken.contains(&name) {
				n += 1;
				name = format!("{}{}", base, n);
			}
			taken.push(name.clone());
			NodeSpec::new(name, dice.roll(100) as u64)
		})
		.collect()
}

/// Channel requests between random pairs of existing nodes, each side
/// contributing up to 3 units and never both nothing.
///
/// With `unique`, pairs that already share a channel are avoided where
/// possible.
fn random_channels(
	beadnet: &Beadnet,
	dice: &mut Dice,
	count: usize,
	unique: bool,
) -> Vec<ChannelSpec> {
	let ids: Vec<String> = beadnet.nodes().into_iter().map(|n| n.id).collect();
	if ids.len() < 2 {
		return Vec::new();
	}
	let mut pairs: Vec<(String, String)> = beadnet
		.channels()
		.into_iter()
		.map(|ch| (ch.source, ch.target))
		.collect();
	let linked = |pairs: &[(String, String)], a: &str, b: &str| {
		pairs
			.iter()
			.any(|(s, t)| (s == a && t == b) || (s == b && t == a))
	};

	(0..count)
		.map(|_| {
			let mut attempts = 0;
			let (source, target) = loop {
				let (a, b) = (&ids[dice.roll(ids.len())], &ids[dice.roll(ids.len())]);
				attempts += 1;
				if a == b {
					if attempts > 100 {
						break (ids[0].clone(), ids[1].clone());
					}
					continue;
				}
				if !unique || !linked(&pairs, a, b) || attempts > ids.len() * ids.len() {
					break (a.clone(), b.clone());
				}
			};
			pairs.push((source.clone(), target.clone()));

			let target_balance = dice.roll(4) as u64;
			let mut source_balance = dice.roll(4) as u64;
			if source_balance == 0 && target_balance == 0 {
				source_balance = dice.roll(4) as u64 + 1;
			}
			ChannelSpec::new(source, target, source_balance, target_balance)
		})
		.collect()
}

/// Start a transfer on a random idle channel.
fn random_transfer(beadnet: &Beadnet, dice: &mut Dice) {
	if beadnet.is_animating() {
		return;
	}
	let channels = beadnet.channels();
	if channels.is_empty() {
		return;
	}
	let ch = &channels[dice.roll(channels.len())];
	let (from, to, available) = if dice.roll(2) == 0 {
		(&ch.source, &ch.target, ch.source_balance)
	} else {
		(&ch.target, &ch.source, ch.target_balance)
	};
	if available == 0 {
		return;
	}
	let count = dice.roll(available as usize) as u64 + 1;
	let (from_id, to_id) = (from.clone(), to.clone());
	if let Err(e) = beadnet.move_beads(from, to, count, move || {
		info!("{} sent {} to {}", from_id, count, to_id)
	}) {
		warn!("transfer rejected: {}", e);
	}
}

fn build_network(beadnet: &Beadnet, dice: &mut Dice) {
	if let Err(e) = beadnet.add_nodes(random_nodes(dice, 8)) {
		warn!("could not add nodes: {}", e);
	}
	for spec in random_channels(beadnet, dice, 10, true) {
		if let Err(e) = beadnet.open_channel(spec) {
			warn!("skipped channel: {}", e);
		}
	}
}

fn open_random_channel(beadnet: &Beadnet, dice: &mut Dice) {
	for spec in random_channels(beadnet, dice, 1, true) {
		if let Err(e) = beadnet.open_channel(spec) {
			warn!("skipped channel: {}", e);
		}
	}
}

fn close_random_channel(beadnet: &Beadnet, dice: &mut Dice) {
	let channels = beadnet.channels();
	if channels.is_empty() {
		return;
	}
	let ch = &channels[dice.roll(channels.len())];
	if let Err(e) = beadnet.close_channel(&ch.source, &ch.target) {
		warn!("close failed: {}", e);
	}
}

fn highlight_random_channel(beadnet: &Beadnet, dice: &mut Dice) {
	let channels = beadnet.channels();
	if channels.is_empty() {
		return;
	}
	let ch = &channels[dice.roll(channels.len())];
	let _ = beadnet.toggle_highlight(&ch.source, &ch.target);
}

/// Default Home Page
///
/// The widget handle is `Rc`-backed, so the page renders it directly
/// instead of inside an `ErrorBoundary` (whose children must be `Send`).
#[component]
pub fn Home() -> impl IntoView {
	let beadnet = Beadnet::new(BeadnetOptions::default());
	let dice = Rc::new(RefCell::new(Dice::new(42)));
	build_network(&beadnet, &mut dice.borrow_mut());

	let (net_tx, dice_tx) = (beadnet.clone(), dice.clone());
	let on_transfer = move |_| random_transfer(&net_tx, &mut dice_tx.borrow_mut());

	let (net_open, dice_open) = (beadnet.clone(), dice.clone());
	let on_open = move |_| open_random_channel(&net_open, &mut dice_open.borrow_mut());

	let (net_close, dice_close) = (beadnet.clone(), dice.clone());
	let on_close = move |_| close_random_channel(&net_close, &mut dice_close.borrow_mut());

	let (net_hl, dice_hl) = (beadnet.clone(), dice);
	let on_highlight = move |_| highlight_random_channel(&net_hl, &mut dice_hl.borrow_mut());

	view! {
		<div class="fullscreen-graph">
			<BeadnetCanvas beadnet=beadnet fullscreen=true />
			<div class="graph-overlay">
				<h1>"Beadnet"</h1>
				<p class="subtitle">"Drag nodes to reposition. Scroll to zoom. Drag background to pan."</p>
				<button on:click=on_transfer>"Random transfer"</button>
				<button on:click=on_open>"Open channel"</button>
				<button on:click=on_close>"Close channel"</button>
				<button on:click=on_highlight>"Highlight channel"</button>
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;
	use crate::components::beadnet::ManualClock;

	#[test]
	fn test_random_nodes_are_unique() {
		let mut dice = Dice::new(1);
		let nodes = random_nodes(&mut dice, 60);
		let mut ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		ids.sort();
		ids.dedup();
		assert_eq!(ids.len(), 60);
		assert!(nodes.iter().all(|n| n.balance < 100));
	}

	#[test]
	fn test_random_channels_are_funded_and_distinct() {
		let beadnet = Beadnet::with_clock(BeadnetOptions::default(), Rc::new(ManualClock::new(0.0)));
		let mut dice = Dice::new(7);
		beadnet.add_nodes(random_nodes(&mut dice, 6)).unwrap();
		let specs = random_channels(&beadnet, &mut dice, 5, true);
		assert_eq!(specs.len(), 5);
		for spec in &specs {
			assert_ne!(spec.source, spec.target);
			assert!(spec.source_balance + spec.target_balance > 0);
			assert!(spec.source_balance <= 4 && spec.target_balance < 4);
		}
	}

	#[test]
	fn test_overlay_actions_keep_funds() {
		let beadnet = Beadnet::with_clock(BeadnetOptions::default(), Rc::new(ManualClock::new(0.0)));
		let mut dice = Dice::new(42);
		build_network(&beadnet, &mut dice);
		let total = |net: &Beadnet| {
			net.nodes().iter().map(|n| n.balance).sum::<u64>()
				+ net.channels().iter().map(|c| c.capacity()).sum::<u64>()
		};
		let before = total(&beadnet);
		let open_before = beadnet.channels().len();

		open_random_channel(&beadnet, &mut dice);
		highlight_random_channel(&beadnet, &mut dice);
		close_random_channel(&beadnet, &mut dice);
		close_random_channel(&beadnet, &mut dice);
		assert!(beadnet.channels().len() < open_before + 1);
		assert_eq!(total(&beadnet), before);
	}

	#[test]
	fn test_dice_stays_in_range() {
		let mut dice = Dice::new(0);
		assert!((0..1000).all(|_| dice.roll(4) < 4));
		assert_eq!(dice.roll(1), 0);
	}
}
