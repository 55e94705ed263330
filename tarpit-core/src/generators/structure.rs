use std::fmt::Write;

use rand::{Rng, RngCore};

use super::corpus::WordCorpus;
use super::css::{generate_random_inline_css, random_css_style, random_inline_style};
use super::primitives::{LOWER_ALPHABET_CHARS, escape_html, random_id, random_int, random_string_from_charset};
use super::text::random_sentence;

/// Size of the per-call class pool used by [`nest_divs`].
const CLASS_POOL_SIZE: usize = 100;

/// Deepest container chain [`nest_divs`] builds; larger depths are clamped
/// so the recursion stays well within a worker thread's stack.
pub const MAX_NEST_DEPTH: usize = 200;

/// How many levels of tables may appear inside a top-level table.
const MAX_TABLE_NESTING: u32 = 3;

const INPUT_TYPES: [&str; 5] = ["text", "radio", "checkbox", "submit", "button"];

/// `depth` nested `<div>` containers around the literal leaf `content`.
///
/// Each level carries noisy classes, inline styles and attributes, so the
/// actual text sits at the bottom of a deep, unstable selector path.
/// Depths above [`MAX_NEST_DEPTH`] are clamped to it.
pub fn nest_divs(rng: &mut dyn RngCore, corpus: &WordCorpus, depth: i64) -> String {
	if depth <= 0 {
		return String::new();
	}

	let pool: Vec<String> = (0..CLASS_POOL_SIZE)
		.map(|_| format!("{}{}", corpus.clean_word(rng), rng.random_range(0..10000)))
		.collect();

	let mut out = String::new();
	let depth = (depth as u64).min(MAX_NEST_DEPTH as u64) as usize;
	build_container(rng, corpus, &pool, depth, &mut out);
	out
}

fn build_container(rng: &mut dyn RngCore, corpus: &WordCorpus, pool: &[String], depth: usize, out: &mut String) {
	if depth == 0 {
		out.push_str("content");
		return;
	}

	let class_count = rng.random_range(3..=10);
	let classes: Vec<&str> = (0..class_count)
		.map(|_| pool[rng.random_range(0..pool.len())].as_str())
		.collect();
	let declarations = rng.random_range(3..=8);
	let style = random_css_style(rng, declarations);

	let mut attributes = String::new();
	for _ in 0..rng.random_range(1..=4) {
		// Infallible: writing into a String.
		let _ = match rng.random_range(0..3) {
			0 => write!(attributes, " data-{}=\"{}\"", corpus.clean_word(rng), corpus.clean_word(rng)),
			1 => write!(attributes, " aria-{}=\"{}\"", corpus.clean_word(rng), corpus.clean_word(rng)),
			_ => write!(attributes, " id=\"{}\"", random_string_from_charset(rng, 8, LOWER_ALPHABET_CHARS)),
		};
	}

	let _ = write!(out, "<div class=\"{}\" style=\"{}\"{}>", classes.join(" "), style, attributes);
	if depth > 1 && rng.random_bool(0.3) {
		let _ = write!(out, "<span>{}</span>", corpus.clean_word(rng));
		build_container(rng, corpus, pool, depth - 1, out);
		let _ = write!(out, "<b>{}</b>", corpus.clean_word(rng));
	} else {
		build_container(rng, corpus, pool, depth - 1, out);
	}
	out.push_str("</div>");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
	Head,
	Body,
	Foot,
}

impl SectionKind {
	fn tag(self) -> &'static str {
		match self {
			SectionKind::Head => "thead",
			SectionKind::Body => "tbody",
			SectionKind::Foot => "tfoot",
		}
	}
}

#[derive(Debug, Clone)]
enum TableCell {
	/// A single-column cell holding another table.
	Nested(Table),
	Data {
		header: bool,
		colspan: usize,
		rowspan: usize,
		style: String,
		attribute: Option<(String, String)>,
		content: String,
	},
}

impl TableCell {
	fn colspan(&self) -> usize {
		match self {
			TableCell::Nested(_) => 1,
			TableCell::Data { colspan, .. } => *colspan,
		}
	}
}

#[derive(Debug, Clone)]
struct TableRow {
	cells: Vec<TableCell>,
}

impl TableRow {
	fn span(&self) -> usize {
		self.cells.iter().map(TableCell::colspan).sum()
	}
}

#[derive(Debug, Clone)]
struct TableSection {
	kind: SectionKind,
	rows: Vec<TableRow>,
}

/// Typed table tree, built first and rendered afterwards.
#[derive(Debug, Clone)]
struct Table {
	class: Option<String>,
	sections: Vec<TableSection>,
}

impl Table {
	fn render(&self, out: &mut String) {
		out.push_str("<table");
		if let Some(class) = &self.class {
			let _ = write!(out, " class=\"{class}\"");
		}
		out.push_str(">\n");

		for section in &self.sections {
			let _ = writeln!(out, "<{}>", section.kind.tag());
			for row in &section.rows {
				out.push_str("<tr>\n");
				for cell in &row.cells {
					match cell {
						TableCell::Nested(table) => {
							out.push_str("<td>");
							table.render(out);
							out.push_str("</td>");
						}
						TableCell::Data { header, colspan, rowspan, style, attribute, content } => {
							let tag = if *header { "th" } else { "td" };
							let _ = write!(out, "<{tag} colspan=\"{colspan}\" rowspan=\"{rowspan}\" style=\"{style}\"");
							if let Some((name, value)) = attribute {
								let _ = write!(out, " data-{name}=\"{value}\"");
							}
							let _ = writeln!(out, ">{content}</{tag}>");
						}
					}
				}
				out.push_str("</tr>\n");
			}
			let _ = writeln!(out, "</{}>", section.kind.tag());
		}
		out.push_str("</table>");
	}
}

fn build_table(rng: &mut dyn RngCore, corpus: &WordCorpus, rows: usize, cols: usize, nesting: u32) -> Table {
	let class = rng.random_bool(0.5).then(|| corpus.clean_word(rng));

	let layout = [
		(SectionKind::Head, 1),
		(SectionKind::Body, rows as i64 - 2),
		(SectionKind::Foot, 1),
	];

	let mut sections = Vec::new();
	let mut row_index = 0;
	for (kind, count) in layout {
		if count <= 0 {
			continue;
		}
		let mut section = TableSection { kind, rows: Vec::new() };
		for _ in 0..count {
			section.rows.push(build_row(rng, corpus, row_index, cols, nesting));
			row_index += 1;
		}
		sections.push(section);
	}

	Table { class, sections }
}

fn build_row(rng: &mut dyn RngCore, corpus: &WordCorpus, row_index: usize, cols: usize, nesting: u32) -> TableRow {
	let mut cells = Vec::new();
	let mut col = 0;

	while col < cols {
		if nesting > 0 && col < cols - 1 && rng.random_bool(0.2) {
			let nested_cols = rng.random_range(1..=2);
			let cell = TableCell::Nested(build_table(rng, corpus, 1, nested_cols, nesting - 1));
			col += cell.colspan();
			cells.push(cell);
			continue;
		}

		let colspan = rng.random_range(1..=5).min(cols - col);
		let rowspan = rng.random_range(1..=5);
		let header = rng.random_bool(0.2);
		let style = generate_random_inline_css(rng);
		let attribute = rng
			.random_bool(0.5)
			.then(|| (corpus.clean_word(rng), corpus.clean_word(rng)));
		let content = format!("{} ({row_index},{col})", corpus.clean_word(rng));

		let cell = TableCell::Data { header, colspan, rowspan, style, attribute, content };
		col += cell.colspan();
		cells.push(cell);
	}

	let row = TableRow { cells };
	debug_assert_eq!(row.span(), cols);
	row
}

/// A table with head, body and foot sections, random spans and occasional
/// nested tables. `rows < 1` or `cols < 1` yields `""`.
pub fn random_complex_table(rng: &mut dyn RngCore, corpus: &WordCorpus, rows: i64, cols: i64) -> String {
	if rows < 1 || cols < 1 {
		return String::new();
	}

	let table = build_table(rng, corpus, rows as usize, cols as usize, MAX_TABLE_NESTING);
	let mut out = String::new();
	table.render(&mut out);
	out
}

/// A `<form>` with `count` labelled inputs of random type.
///
/// Each label carries between zero and `style_count - 1` inline declarations.
pub fn random_form(rng: &mut dyn RngCore, corpus: &WordCorpus, count: i64, style_count: i64) -> String {
	let mut out = String::from("<form>\n");
	for _ in 0..count.max(0) {
		let id = random_id(rng, "input", 5);
		let kind = INPUT_TYPES[rng.random_range(0..INPUT_TYPES.len())];
		let declarations = random_int(rng, 0, style_count);
		let style = random_inline_style(rng, declarations);
		let _ = writeln!(out, "<input type=\"{kind}\" id=\"{id}\">");
		let _ = writeln!(out, "<label for=\"{id}\" {style}>{}</label>", corpus.clean_word(rng));
	}
	out.push_str("</form>");
	out
}

/// A `<dl>` of `count` term/definition pairs; definitions are `len`-word sentences.
pub fn random_definition_data(rng: &mut dyn RngCore, corpus: &WordCorpus, count: i64, len: i64) -> String {
	let mut out = String::from("<dl>\n");
	for _ in 0..count.max(0) {
		let term = corpus.clean_word(rng);
		let definition = escape_html(&random_sentence(rng, corpus, len));
		let _ = writeln!(out, "<dt>{term}</dt><dd>{definition}</dd>");
	}
	out.push_str("</dl>");
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn check_spans(table: &Table, cols: usize) {
		for section in &table.sections {
			for row in &section.rows {
				assert_eq!(row.span(), cols);
				for cell in &row.cells {
					if let TableCell::Nested(inner) = cell {
						let inner_cols = inner.sections[0].rows[0].span();
						assert!((1..=2).contains(&inner_cols));
						check_spans(inner, inner_cols);
					}
				}
			}
		}
	}

	fn depth_of(table: &Table) -> u32 {
		let mut deepest = 0;
		for section in &table.sections {
			for row in &section.rows {
				for cell in &row.cells {
					if let TableCell::Nested(inner) = cell {
						deepest = deepest.max(1 + depth_of(inner));
					}
				}
			}
		}
		deepest
	}

	#[test]
	fn nest_divs_non_positive_depth_is_empty() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(0);
		assert_eq!(nest_divs(&mut rng, &corpus, 0), "");
		assert_eq!(nest_divs(&mut rng, &corpus, -4), "");
	}

	#[test]
	fn nest_divs_has_one_container_per_level() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(11);
		for depth in 1..=6 {
			let html = nest_divs(&mut rng, &corpus, depth);
			assert_eq!(html.matches("<div").count(), depth as usize);
			assert_eq!(html.matches("</div>").count(), depth as usize);
			assert_eq!(html.matches(">content</div>").count(), 1);
			assert!(html.ends_with("</div>"));
		}
	}

	#[test]
	fn nest_divs_depth_three() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(3);
		let html = nest_divs(&mut rng, &corpus, 3);
		assert!(html.starts_with("<div class=\""));
		assert_eq!(html.matches("<div").count(), 3);
		// Span/bold siblings only wrap levels that still have a container below.
		assert!(html.matches("<span>").count() <= 2);
	}

	#[test]
	fn nest_divs_clamps_huge_depth() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(5);
		let html = nest_divs(&mut rng, &corpus, 1_000_000);
		assert_eq!(html.matches("<div").count(), MAX_NEST_DEPTH);
		assert_eq!(html.matches(">content</div>").count(), 1);

		let html = nest_divs(&mut rng, &corpus, i64::MAX);
		assert_eq!(html.matches("</div>").count(), MAX_NEST_DEPTH);
	}

	#[test]
	fn table_rows_span_requested_columns() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(21);
		for cols in 1..=8 {
			let table = build_table(&mut rng, &corpus, 5, cols, MAX_TABLE_NESTING);
			check_spans(&table, cols);
			assert!(depth_of(&table) <= MAX_TABLE_NESTING);
		}
	}

	#[test]
	fn table_sections() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(5);
		let table = build_table(&mut rng, &corpus, 1, 3, 0);
		let kinds: Vec<SectionKind> = table.sections.iter().map(|s| s.kind).collect();
		assert_eq!(kinds, vec![SectionKind::Head, SectionKind::Foot]);

		let table = build_table(&mut rng, &corpus, 6, 3, 0);
		assert_eq!(table.sections[1].rows.len(), 4);
	}

	#[test]
	fn degenerate_table_is_empty() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(6);
		assert_eq!(random_complex_table(&mut rng, &corpus, 0, 3), "");
		assert_eq!(random_complex_table(&mut rng, &corpus, 3, 0), "");
		let html = random_complex_table(&mut rng, &corpus, 3, 3);
		assert!(html.starts_with("<table"));
		assert!(html.ends_with("</table>"));
	}

	#[test]
	fn form_labels_match_inputs() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(8);
		let html = random_form(&mut rng, &corpus, 4, 3);
		assert_eq!(html.matches("<input type=").count(), 4);
		assert_eq!(html.matches("<label for=\"input-").count(), 4);
		assert_eq!(random_form(&mut rng, &corpus, 0, 3), "<form>\n</form>");
	}

	#[test]
	fn definition_list_pairs() {
		let corpus = WordCorpus::embedded();
		let mut rng = StdRng::seed_from_u64(9);
		let html = random_definition_data(&mut rng, &corpus, 3, 5);
		assert_eq!(html.matches("<dt>").count(), 3);
		assert_eq!(html.matches("<dd>").count(), 3);
	}
}
