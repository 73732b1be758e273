//! Channel paths and bead placement along them.

use super::options::BeadnetOptions;
use super::types::Point;

/// A traversable curve with an arc-length parametrisation.
pub trait ChannelPath {
	/// Arc length from end to end.
	fn total_length(&self) -> f64;

	/// Point at arc-length `d` from the start; `d` is clamped to the path.
	fn point_at_length(&self, d: f64) -> Point;
}

/// Straight segment between two node centres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinePath {
	/// Source end.
	pub from: Point,
	/// Target end.
	pub to: Point,
}

impl ChannelPath for LinePath {
	fn total_length(&self) -> f64 {
		self.from.distance(self.to)
	}

	fn point_at_length(&self, d: f64) -> Point {
		let len = self.total_length();
		if len < f64::EPSILON {
			return self.from;
		}
		self.from.lerp(self.to, d.clamp(0.0, len) / len)
	}
}

const CURVE_SAMPLES: usize = 48;

/// Quadratic Bézier with a sampled arc-length table.
#[derive(Clone, Debug, PartialEq)]
pub struct CurvePath {
	/// Source end.
	pub from: Point,
	/// Bézier control point.
	pub control: Point,
	/// Target end.
	pub to: Point,
	samples: Vec<Point>,
	lengths: Vec<f64>,
}

impl CurvePath {
	/// Curve through `from` and `to`, pulled toward `control`.
	pub fn new(from: Point, control: Point, to: Point) -> Self {
		let samples: Vec<Point> = (0..=CURVE_SAMPLES)
			.map(|i| quadratic(from, control, to, i as f64 / CURVE_SAMPLES as f64))
			.collect();
		let mut lengths = Vec::with_capacity(samples.len());
		let mut acc = 0.0;
		lengths.push(acc);
		for pair in samples.windows(2) {
			acc += pair[0].distance(pair[1]);
			lengths.push(acc);
		}
		Self {
			from,
			control,
			to,
			samples,
			lengths,
		}
	}

	/// Curve from `from` to `to` whose apex sits `bend` units off the
	/// straight line, on the side picked by the sign of `bend`.
	pub fn bent(from: Point, to: Point, bend: f64) -> Self {
		let mid = from.lerp(to, 0.5);
		let len = from.distance(to).max(f64::EPSILON);
		let (nx, ny) = (-(to.y - from.y) / len, (to.x - from.x) / len);
		// control point sits at twice the offset of the curve's apex
		let control = Point::new(mid.x + nx * bend * 2.0, mid.y + ny * bend * 2.0);
		Self::new(from, control, to)
	}
}

fn quadratic(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
	let u = 1.0 - t;
	Point::new(
		u * u * p0.x + 2.0 * u * t * p1.x + t * t * p2.x,
		u * u * p0.y + 2.0 * u * t * p1.y + t * t * p2.y,
	)
}

impl ChannelPath for CurvePath {
	fn total_length(&self) -> f64 {
		self.lengths.last().copied().unwrap_or(0.0)
	}

	fn point_at_length(&self, d: f64) -> Point {
		let d = d.clamp(0.0, self.total_length());
		let i = self.lengths.partition_point(|&l| l < d);
		if i == 0 {
			return self.samples[0];
		}
		let (l0, l1) = (self.lengths[i - 1], self.lengths[i]);
		let t = if l1 > l0 { (d - l0) / (l1 - l0) } else { 0.0 };
		self.samples[i - 1].lerp(self.samples[i], t)
	}
}

/// Either shape a channel may be drawn with.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderedPath {
	/// The only channel between its two nodes.
	Line(LinePath),
	/// One of several parallel channels.
	Curve(CurvePath),
}

impl RenderedPath {
	/// A straight line when `bend` is zero, a curve otherwise.
	pub fn between(from: Point, to: Point, bend: f64) -> Self {
		if bend.abs() < f64::EPSILON {
			RenderedPath::Line(LinePath { from, to })
		} else {
			RenderedPath::Curve(CurvePath::bent(from, to, bend))
		}
	}
}

impl ChannelPath for RenderedPath {
	fn total_length(&self) -> f64 {
		match self {
			RenderedPath::Line(p) => p.total_length(),
			RenderedPath::Curve(p) => p.total_length(),
		}
	}

	fn point_at_length(&self, d: f64) -> Point {
		match self {
			RenderedPath::Line(p) => p.point_at_length(d),
			RenderedPath::Curve(p) => p.point_at_length(d),
		}
	}
}

/// Sizes that decide where beads sit on a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeadGeometry {
	/// See [`BeadOptions::radius`](super::BeadOptions::radius).
	pub bead_radius: f64,
	/// Gap between neighbouring beads.
	pub bead_spacing: f64,
	/// Bead outline width.
	pub bead_stroke_width: f64,
	/// Node circle radius.
	pub node_radius: f64,
	/// Node outline width.
	pub node_stroke_width: f64,
}

impl BeadGeometry {
	/// The sizes configured in `opt`.
	pub fn from_options(opt: &BeadnetOptions) -> Self {
		Self {
			bead_radius: opt.beads.radius,
			bead_spacing: opt.beads.spacing,
			bead_stroke_width: opt.beads.stroke_width,
			node_radius: opt.nodes.radius,
			node_stroke_width: opt.nodes.stroke_width,
		}
	}

	/// Length kept free at each end so beads clear the node glyph.
	pub fn channel_padding(&self) -> f64 {
		self.node_radius
			+ self.node_stroke_width / 2.0
			+ self.bead_radius
			+ self.bead_stroke_width / 2.0
			+ self.bead_spacing
	}

	/// Centre-to-centre distance of neighbouring beads.
	pub fn distance_between_beads(&self) -> f64 {
		2.0 * self.bead_radius + self.bead_spacing + self.bead_stroke_width
	}

	/// Place bead `index` of `total` at animation `progress` along `path`.
	///
	/// Progress 0 is the bead's slot counted from the source end, progress 1
	/// the mirrored slot counted from the target end.
	pub fn position(&self, path: &impl ChannelPath, index: usize, total: usize, progress: f64) -> Point {
		let padding = self.channel_padding();
		let step = self.distance_between_beads();
		let start = padding + index as f64 * step;
		let end = padding + (total.saturating_sub(1 + index)) as f64 * step;
		let travel = path.total_length() - start - end;
		path.point_at_length(start + progress * travel)
	}
}
