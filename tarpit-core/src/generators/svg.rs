use std::fmt::Write;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use super::primitives::{random_hex_color, random_id};

const SVG_WIDTH: u32 = 500;
const SVG_HEIGHT: u32 = 500;

/// Builds a random SVG of the requested kind: `"fractal"` or `"filters"`.
///
/// Unknown kinds yield `""`.
pub fn random_svg(rng: &mut dyn RngCore, kind: &str) -> String {
	match kind {
		"fractal" => fractal_svg(rng),
		"filters" => filters_svg(rng),
		_ => String::new(),
	}
}

/// A single path drawing a randomized fractal tree from the bottom centre.
pub fn fractal_svg(rng: &mut dyn RngCore) -> String {
	let length = rng.random_range(70..110) as f64;
	let depth = rng.random_range(4..=5);

	let mut path = String::new();
	draw_branch(rng, &mut path, (SVG_WIDTH as f64 / 2.0, SVG_HEIGHT as f64), -90.0, length, depth);

	format!(
		r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg"><path d="{path}" stroke="{color}" stroke-width="2" fill="none" /></svg>"#,
		w = SVG_WIDTH,
		h = SVG_HEIGHT,
		color = random_hex_color(rng),
	)
}

/// Appends one segment and recurses into 2 or 3 shorter, rotated children.
fn draw_branch(rng: &mut dyn RngCore, path: &mut String, from: (f64, f64), angle: f64, length: f64, depth: u32) {
	if depth == 0 {
		return;
	}

	let rad = angle.to_radians();
	let to = (from.0 + length * rad.cos(), from.1 + length * rad.sin());
	let _ = write!(path, "M{:.2},{:.2} L{:.2},{:.2} ", from.0, from.1, to.0, to.1);

	for _ in 0..rng.random_range(2..=3) {
		let child_angle = angle + rng.random_range(-40.0..=40.0);
		let child_length = length * rng.random_range(0.70..=0.85);
		draw_branch(rng, path, to, child_angle, child_length, depth - 1);
	}
}

/// SVG filter primitives that can be chained inside one `<filter>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPrimitive {
	GaussianBlur,
	Morphology,
	Turbulence,
	ColorMatrix,
	ConvolveMatrix,
	DisplacementMap,
}

impl FilterPrimitive {
	pub const ALL: [FilterPrimitive; 6] = [
		FilterPrimitive::GaussianBlur,
		FilterPrimitive::Morphology,
		FilterPrimitive::Turbulence,
		FilterPrimitive::ColorMatrix,
		FilterPrimitive::ConvolveMatrix,
		FilterPrimitive::DisplacementMap,
	];

	/// Renders the primitive element with random parameters.
	pub fn render(self, rng: &mut dyn RngCore) -> String {
		match self {
			FilterPrimitive::GaussianBlur => {
				format!(r#"<feGaussianBlur stdDeviation="{}" />"#, rng.random_range(2..=5))
			}
			FilterPrimitive::Morphology => {
				let operator = if rng.random_bool(0.5) { "erode" } else { "dilate" };
				format!(r#"<feMorphology operator="{operator}" radius="{}" />"#, rng.random_range(2..=4))
			}
			FilterPrimitive::Turbulence => {
				let kind = if rng.random_bool(0.5) { "fractalNoise" } else { "turbulence" };
				let frequency: f64 = rng.random_range(0.01..0.08);
				let octaves = rng.random_range(2..=3);
				format!(r#"<feTurbulence type="{kind}" baseFrequency="{frequency:.4}" numOctaves="{octaves}" result="noise" />"#)
			}
			FilterPrimitive::ColorMatrix => {
				if rng.random_bool(0.5) {
					format!(r#"<feColorMatrix type="saturate" values="{:.2}" />"#, rng.random::<f64>())
				} else {
					format!(r#"<feColorMatrix type="hueRotate" values="{:.2}" />"#, rng.random_range(0..360) as f64)
				}
			}
			FilterPrimitive::ConvolveMatrix => {
				let kernel: Vec<String> = (0..9)
					.map(|_| format!("{:.2}", rng.random_range(-1.5..=1.5)))
					.collect();
				let bias: f64 = rng.random_range(0.0..0.3);
				format!(
					r#"<feConvolveMatrix order="3" kernelMatrix="{}" bias="{bias:.2}" />"#,
					kernel.join(" ")
				)
			}
			FilterPrimitive::DisplacementMap => {
				format!(
					r#"<feDisplacementMap in="SourceGraphic" in2="noise" scale="{}" />"#,
					rng.random_range(20..75)
				)
			}
		}
	}
}

/// A centred rectangle run through a shuffled chain of 3 to 5 filter primitives.
pub fn filters_svg(rng: &mut dyn RngCore) -> String {
	let filter_id = random_id(rng, "filter", 8);

	let mut primitives = FilterPrimitive::ALL;
	primitives.shuffle(rng);
	let count = rng.random_range(3..=5);
	let chain: String = primitives[..count].iter().map(|p| p.render(rng)).collect();

	let width = rng.random_range(200..300);
	let height = rng.random_range(150..250);
	let x = (SVG_WIDTH - width) / 2;
	let y = (SVG_HEIGHT - height) / 2;

	format!(
		r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg"><defs><filter id="{filter_id}" x="-50%" y="-50%" width="200%" height="200%">{chain}</filter></defs><rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{color}" filter="url(#{filter_id})" /></svg>"#,
		w = SVG_WIDTH,
		h = SVG_HEIGHT,
		color = random_hex_color(rng),
	)
}
