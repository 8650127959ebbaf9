/// Duration of animated zoom/pan changes, in seconds.
pub const TRANSITION_SECS: f64 = 0.75;

/// Screen = graph * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	/// Transform that puts graph point `(gx, gy)` at the centre of a
	/// `width` x `height` screen, scaled by `k`.
	pub fn centered_on(gx: f64, gy: f64, width: f64, height: f64, k: f64) -> Self {
		Self {
			x: width / 2.0 - gx * k,
			y: height / 2.0 - gy * k,
			k,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	#[cfg(test)]
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	/// Scales by `factor` keeping screen point `(sx, sy)` fixed.
	pub fn zoom_around(&self, sx: f64, sy: f64, factor: f64, min_k: f64, max_k: f64) -> Self {
		let k = (self.k * factor).clamp(min_k, max_k);
		let ratio = k / self.k;
		Self {
			x: sx - (sx - self.x) * ratio,
			y: sy - (sy - self.y) * ratio,
			k,
		}
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// An in-flight animation between two transforms.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

impl Transition {
	pub fn new(from: ViewTransform, to: ViewTransform) -> Self {
		Self {
			from,
			to,
			elapsed: 0.0,
			duration: TRANSITION_SECS,
		}
	}

	/// Advances by `dt` seconds, returning the transform to show and whether
	/// the animation has finished.
	pub fn advance(&mut self, dt: f64) -> (ViewTransform, bool) {
		self.elapsed = (self.elapsed + dt).min(self.duration);
		let done = self.elapsed >= self.duration;
		if done {
			return (self.to, true);
		}
		let t = ease_cubic_in_out(self.elapsed / self.duration);
		(self.from.lerp(&self.to, t), false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn centering_maps_point_to_screen_middle() {
		let t = ViewTransform::centered_on(40.0, 70.0, 800.0, 600.0, 1.5);
		assert_eq!(t.graph_to_screen(40.0, 70.0), (400.0, 300.0));
		assert_eq!(t.screen_to_graph(400.0, 300.0), (40.0, 70.0));
	}

	#[test]
	fn zoom_keeps_anchor_and_clamps() {
		let t = ViewTransform::IDENTITY.zoom_around(100.0, 50.0, 2.0, 0.1, 8.0);
		assert_eq!(t.k, 2.0);
		assert_eq!(t.graph_to_screen(100.0, 50.0), (100.0, 50.0));

		let max = t.zoom_around(0.0, 0.0, 100.0, 0.1, 8.0);
		assert_eq!(max.k, 8.0);
	}

	#[test]
	fn easing_endpoints() {
		assert_eq!(ease_cubic_in_out(0.0), 0.0);
		assert_eq!(ease_cubic_in_out(0.5), 0.5);
		assert_eq!(ease_cubic_in_out(1.0), 1.0);
	}

	#[test]
	fn transition_lands_on_target_after_duration() {
		let to = ViewTransform {
			x: -200.0,
			y: 40.0,
			k: 1.5,
		};
		let mut tr = Transition::new(ViewTransform::IDENTITY, to);

		let (mid, done) = tr.advance(TRANSITION_SECS / 2.0);
		assert!(!done);
		assert!((mid.k - 1.25).abs() < 1e-9);

		let (end, done) = tr.advance(1.0);
		assert!(done);
		assert_eq!(end, to);
	}
}
