//! Explicit rendering context: options plus a time source.

use std::cell::Cell;
use std::rc::Rc;

use super::options::BeadnetOptions;
use super::path::BeadGeometry;

/// Source of the current time, in milliseconds.
pub trait Clock {
	/// Milliseconds since an arbitrary origin.
	fn now(&self) -> f64;
}

/// Browser clock backed by `performance.now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
	fn now(&self) -> f64 {
		web_sys::window()
			.and_then(|w| w.performance())
			.map(|p| p.now())
			.unwrap_or(0.0)
	}
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
	now: Rc<Cell<f64>>,
}

impl ManualClock {
	/// A clock reading `start` until moved.
	pub fn new(start: f64) -> Self {
		Self {
			now: Rc::new(Cell::new(start)),
		}
	}

	/// Jump to `now`.
	pub fn set(&self, now: f64) {
		self.now.set(now);
	}

	/// Move forward by `ms`.
	pub fn advance(&self, ms: f64) {
		self.now.set(self.now.get() + ms);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> f64 {
		self.now.get()
	}
}

/// Options and clock shared by placement and animation.
pub struct Context {
	pub options: BeadnetOptions,
	clock: Rc<dyn Clock>,
}

impl Context {
	pub fn new(options: BeadnetOptions, clock: Rc<dyn Clock>) -> Self {
		Self {
			options: options.resolved(),
			clock,
		}
	}

	pub fn now(&self) -> f64 {
		self.clock.now()
	}

	pub fn geometry(&self) -> BeadGeometry {
		BeadGeometry::from_options(&self.options)
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context")
			.field("options", &self.options)
			.field("now", &self.now())
			.finish()
	}
}
