//! Frame-polled bead transfers.
//!
//! A transfer is a batch of tweens, one per bead. Tweens are plain records
//! evaluated against the current time, so progress can be sampled at any
//! frame without accumulating drift. [`Animator::poll`] reports the beads
//! that arrived since the last poll and the batches that are now complete.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::beads::Bead;
use super::types::Side;

/// Callback run once a whole transfer has settled.
pub type Completion = Box<dyn FnOnce()>;

/// d3's `easeQuadInOut`.
pub fn ease_quad_in_out(t: f64) -> f64 {
	let t = t * 2.0;
	if t <= 1.0 {
		t * t / 2.0
	} else {
		let t = t - 1.0;
		(t * (2.0 - t) + 1.0) / 2.0
	}
}

/// Beads to move for a transfer of up to `count` units off `from`,
/// innermost first, paired with their rank from the boundary between the
/// sides. Beads in `busy` are already travelling and are never picked.
pub fn select_beads(
	beads: &[Bead],
	from: Side,
	count: u64,
	busy: &HashSet<usize>,
) -> Vec<(usize, usize)> {
	let resting = |b: &&Bead| b.side == from && !busy.contains(&b.index);
	let picked: Vec<usize> = match from {
		Side::Source => beads
			.iter()
			.rev()
			.filter(resting)
			.take(count as usize)
			.map(|b| b.index)
			.collect(),
		Side::Target => beads
			.iter()
			.filter(resting)
			.take(count as usize)
			.map(|b| b.index)
			.collect(),
	};
	picked
		.into_iter()
		.enumerate()
		.map(|(distance, index)| (index, distance))
		.collect()
}

/// One bead's trip across its channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
	pub channel_id: String,
	pub bead_id: String,
	pub index: usize,
	pub from: Side,
	pub start: f64,
	pub delay: f64,
	pub duration: f64,
	pub batch: u64,
}

impl Tween {
	/// Linear completion in `[0, 1]` at `now`.
	pub fn raw(&self, now: f64) -> f64 {
		let elapsed = now - self.start - self.delay;
		if self.duration <= 0.0 {
			return if elapsed >= 0.0 { 1.0 } else { 0.0 };
		}
		(elapsed / self.duration).clamp(0.0, 1.0)
	}

	/// Eased bead progress at `now`, from the resting value of `from`
	/// toward the opposite one.
	pub fn progress(&self, now: f64) -> f64 {
		let (a, b) = (
			self.from.resting_progress(),
			self.from.opposite().resting_progress(),
		);
		a + (b - a) * ease_quad_in_out(self.raw(now))
	}

	pub fn finish_time(&self) -> f64 {
		self.start + self.delay + self.duration
	}
}

struct Batch {
	id: u64,
	channel_id: String,
	remaining: usize,
	on_complete: Option<Completion>,
}

/// A bead that reached the far side.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrival {
	pub channel_id: String,
	pub index: usize,
	pub from: Side,
}

/// A batch whose last bead has arrived.
pub struct FinishedTransfer {
	pub channel_id: String,
	pub on_complete: Option<Completion>,
}

impl std::fmt::Debug for FinishedTransfer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FinishedTransfer")
			.field("channel_id", &self.channel_id)
			.field("has_callback", &self.on_complete.is_some())
			.finish()
	}
}

#[derive(Debug, Default)]
pub struct Poll {
	/// In the order the beads arrived.
	pub arrivals: Vec<Arrival>,
	pub finished: Vec<FinishedTransfer>,
}

/// Scheduler for every in-flight transfer.
#[derive(Default)]
pub struct Animator {
	tweens: Vec<Tween>,
	batches: Vec<Batch>,
	/// Batches whose channel went away; reported by the next poll.
	cancelled: Vec<Batch>,
	next_batch: u64,
}

/// Timing of a single transfer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
	pub now: f64,
	pub duration: f64,
	pub stagger: f64,
}

impl Animator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Schedule the selected beads of a channel to cross from `from`.
	///
	/// Selected indices without a bead are skipped. Returns the batch id.
	pub fn start(
		&mut self,
		channel_id: &str,
		beads: &[Bead],
		selection: &[(usize, usize)],
		from: Side,
		timing: Timing,
		on_complete: Option<Completion>,
	) -> u64 {
		let id = self.next_batch;
		self.next_batch += 1;

		let mut scheduled = 0;
		for &(index, distance) in selection {
			let Some(bead) = beads.get(index) else {
				continue;
			};
			self.tweens.push(Tween {
				channel_id: channel_id.to_string(),
				bead_id: bead.id.clone(),
				index,
				from,
				start: timing.now,
				delay: distance as f64 * timing.stagger,
				duration: timing.duration,
				batch: id,
			});
			scheduled += 1;
		}
		debug!("batch {} on {}: {} bead(s)", id, channel_id, scheduled);
		self.batches.push(Batch {
			id,
			channel_id: channel_id.to_string(),
			remaining: scheduled,
			on_complete,
		});
		id
	}

	/// Current progress of a bead in flight.
	pub fn progress(&self, channel_id: &str, bead_id: &str, now: f64) -> Option<f64> {
		self.tweens
			.iter()
			.find(|t| t.channel_id == channel_id && t.bead_id == bead_id)
			.map(|t| t.progress(now))
	}

	pub fn is_animating(&self, channel_id: &str) -> bool {
		self.batches.iter().any(|b| b.channel_id == channel_id)
	}

	/// Bead indices of a channel that are currently travelling.
	pub fn in_flight(&self, channel_id: &str) -> HashSet<usize> {
		self.tweens
			.iter()
			.filter(|t| t.channel_id == channel_id)
			.map(|t| t.index)
			.collect()
	}

	pub fn is_idle(&self) -> bool {
		self.batches.is_empty() && self.cancelled.is_empty()
	}

	/// Drop every tween of a channel that no longer exists.
	///
	/// Its batches end here; each is reported as finished by the next
	/// [`Self::poll`] so its callback still runs exactly once. Returns the
	/// number of beads that were cut short.
	pub fn cancel_channel(&mut self, channel_id: &str) -> usize {
		let mut dropped: HashMap<u64, usize> = HashMap::new();
		self.tweens.retain(|t| {
			if t.channel_id == channel_id {
				*dropped.entry(t.batch).or_default() += 1;
				false
			} else {
				true
			}
		});
		let (over, running): (Vec<Batch>, Vec<Batch>) = std::mem::take(&mut self.batches)
			.into_iter()
			.partition(|b| b.channel_id == channel_id);
		self.batches = running;
		for mut batch in over {
			let cut = dropped.get(&batch.id).copied().unwrap_or(0);
			batch.remaining = batch.remaining.saturating_sub(cut);
			debug!("batch {} on {} cancelled, {} bead(s) cut short", batch.id, channel_id, cut);
			self.cancelled.push(batch);
		}
		dropped.values().sum()
	}

	pub fn tweens(&self) -> &[Tween] {
		&self.tweens
	}

	/// Retire every tween that reached the end by `now`.
	pub fn poll(&mut self, now: f64) -> Poll {
		let (mut done, pending): (Vec<Tween>, Vec<Tween>) = std::mem::take(&mut self.tweens)
			.into_iter()
			.partition(|t| t.raw(now) >= 1.0);
		self.tweens = pending;
		done.sort_by(|a, b| a.finish_time().total_cmp(&b.finish_time()));

		let mut poll = Poll::default();
		for tween in done {
			if let Some(batch) = self.batches.iter_mut().find(|b| b.id == tween.batch) {
				batch.remaining = batch.remaining.saturating_sub(1);
			}
			poll.arrivals.push(Arrival {
				channel_id: tween.channel_id,
				index: tween.index,
				from: tween.from,
			});
		}

		let (finished, running): (Vec<Batch>, Vec<Batch>) = std::mem::take(&mut self.batches)
			.into_iter()
			.partition(|b| b.remaining == 0);
		self.batches = running;
		poll.finished = std::mem::take(&mut self.cancelled)
			.into_iter()
			.chain(finished)
			.map(|b| FinishedTransfer {
				channel_id: b.channel_id,
				on_complete: b.on_complete,
			})
			.collect();
		poll
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;
	use crate::components::beadnet::beads::derive_beads;
	use crate::components::beadnet::types::Channel;

	fn channel(sb: u64, tb: u64) -> Channel {
		Channel {
			id: "ch".into(),
			source: "a".into(),
			target: "b".into(),
			source_balance: sb,
			target_balance: tb,
			highlighted: false,
		}
	}

	const TIMING: Timing = Timing {
		now: 0.0,
		duration: 1000.0,
		stagger: 100.0,
	};

	#[test]
	fn test_ease_endpoints_and_symmetry() {
		assert_eq!(ease_quad_in_out(0.0), 0.0);
		assert_eq!(ease_quad_in_out(0.5), 0.5);
		assert_eq!(ease_quad_in_out(1.0), 1.0);
		assert!((ease_quad_in_out(0.25) + ease_quad_in_out(0.75) - 1.0).abs() < 1e-12);
	}

	fn select(ch: &Channel, from: Side, count: u64) -> Vec<(usize, usize)> {
		select_beads(&derive_beads(ch), from, count, &HashSet::new())
	}

	#[test]
	fn test_select_innermost_beads() {
		let ch = channel(3, 2);
		assert_eq!(select(&ch, Side::Source, 2), vec![(2, 0), (1, 1)]);
		assert_eq!(select(&ch, Side::Target, 2), vec![(3, 0), (4, 1)]);
		assert!(select(&ch, Side::Source, 0).is_empty());
		assert_eq!(select(&ch, Side::Target, 9).len(), 2);
	}

	#[test]
	fn test_select_skips_travelling_beads() {
		let beads = derive_beads(&channel(3, 2));
		let busy: HashSet<usize> = [2].into_iter().collect();
		assert_eq!(
			select_beads(&beads, Side::Source, 3, &busy),
			vec![(1, 0), (0, 1)]
		);
		let busy: HashSet<usize> = [0, 1, 2].into_iter().collect();
		assert!(select_beads(&beads, Side::Source, 1, &busy).is_empty());
	}

	#[test]
	fn test_progress_is_pure() {
		let tween = Tween {
			channel_id: "ch".into(),
			bead_id: "b".into(),
			index: 0,
			from: Side::Target,
			start: 100.0,
			delay: 50.0,
			duration: 200.0,
			batch: 0,
		};
		assert_eq!(tween.progress(0.0), 1.0);
		assert_eq!(tween.progress(150.0), 1.0);
		assert_eq!(tween.progress(250.0), 0.5);
		// re-evaluating an earlier frame gives the same answer
		assert_eq!(tween.progress(150.0), 1.0);
		assert_eq!(tween.progress(350.0), 0.0);
		assert_eq!(tween.finish_time(), 350.0);
	}

	#[test]
	fn test_arrivals_follow_delay_and_batch_completes_once() {
		let ch = channel(3, 2);
		let beads = derive_beads(&ch);
		let calls = Rc::new(Cell::new(0));
		let counter = calls.clone();

		let mut animator = Animator::new();
		animator.start(
			&ch.id,
			&beads,
			&select(&ch, Side::Source, 2),
			Side::Source,
			TIMING,
			Some(Box::new(move || counter.set(counter.get() + 1))),
		);
		assert!(animator.is_animating("ch"));
		assert_eq!(animator.progress("ch", &beads[2].id, 500.0), Some(0.5));
		assert_eq!(animator.progress("ch", &beads[0].id, 500.0), None);

		let poll = animator.poll(999.0);
		assert!(poll.arrivals.is_empty() && poll.finished.is_empty());

		let poll = animator.poll(1000.0);
		assert_eq!(poll.arrivals.len(), 1);
		assert_eq!(poll.arrivals[0].index, 2);
		assert!(poll.finished.is_empty());

		let poll = animator.poll(1100.0);
		assert_eq!(poll.arrivals[0].index, 1);
		assert_eq!(poll.finished.len(), 1);
		for done in poll.finished {
			(done.on_complete.unwrap())();
		}
		assert_eq!(calls.get(), 1);
		assert!(animator.is_idle());
		assert!(animator.poll(5000.0).finished.is_empty());
	}

	#[test]
	fn test_late_poll_orders_by_finish_time() {
		let ch = channel(0, 4);
		let beads = derive_beads(&ch);
		let mut animator = Animator::new();
		animator.start(
			&ch.id,
			&beads,
			&select(&ch, Side::Target, 3),
			Side::Target,
			TIMING,
			None,
		);
		let poll = animator.poll(10_000.0);
		let order: Vec<usize> = poll.arrivals.iter().map(|a| a.index).collect();
		assert_eq!(order, vec![0, 1, 2]);
		assert_eq!(poll.finished.len(), 1);
	}

	#[test]
	fn test_empty_batch_finishes_on_next_poll() {
		let ch = channel(1, 1);
		let mut animator = Animator::new();
		animator.start(&ch.id, &derive_beads(&ch), &[], Side::Source, TIMING, None);
		assert!(!animator.is_idle());
		assert_eq!(animator.poll(0.0).finished.len(), 1);
		assert!(animator.is_idle());
	}

	#[test]
	fn test_cancelled_channel_reports_once_and_forgets_tweens() {
		let ch = channel(3, 2);
		let beads = derive_beads(&ch);
		let calls = Rc::new(Cell::new(0));
		let counter = calls.clone();

		let mut animator = Animator::new();
		animator.start(
			&ch.id,
			&beads,
			&select(&ch, Side::Source, 3),
			Side::Source,
			TIMING,
			Some(Box::new(move || counter.set(counter.get() + 1))),
		);
		// first bead lands, the other two are still travelling
		assert_eq!(animator.poll(1000.0).arrivals.len(), 1);
		assert_eq!(animator.in_flight("ch").len(), 2);

		assert_eq!(animator.cancel_channel("ch"), 2);
		assert!(!animator.is_animating("ch"));
		assert!(animator.in_flight("ch").is_empty());
		assert_eq!(animator.progress("ch", &beads[0].id, 1100.0), None);
		assert!(!animator.is_idle());

		let poll = animator.poll(5000.0);
		assert!(poll.arrivals.is_empty());
		assert_eq!(poll.finished.len(), 1);
		for done in poll.finished {
			(done.on_complete.unwrap())();
		}
		assert_eq!(calls.get(), 1);
		assert!(animator.is_idle());
		assert!(animator.poll(9000.0).finished.is_empty());
	}

	#[test]
	fn test_cancel_leaves_other_channels_running() {
		let (a, mut b) = (channel(2, 0), channel(2, 0));
		b.id = "other".into();
		let mut animator = Animator::new();
		animator.start(
			&a.id,
			&derive_beads(&a),
			&select(&a, Side::Source, 2),
			Side::Source,
			TIMING,
			None,
		);
		animator.start(
			&b.id,
			&derive_beads(&b),
			&select(&b, Side::Source, 2),
			Side::Source,
			TIMING,
			None,
		);

		assert_eq!(animator.cancel_channel("ch"), 2);
		assert!(animator.is_animating("other"));
		let poll = animator.poll(1100.0);
		assert_eq!(poll.arrivals.len(), 2);
		assert!(poll.arrivals.iter().all(|a| a.channel_id == "other"));
		assert_eq!(poll.finished.len(), 2);
	}
}
