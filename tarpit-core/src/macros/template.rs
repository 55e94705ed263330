//! A small text/template dialect.
//!
//! ```text
//! {{ expr }}                          output a value
//! {{ range expr }} ... {{ end }}      repeat over an int count or a list (.Index, .Item)
//! {{ with expr }} ... {{ end }}       rebind dot (.Style, .Class of a style block)
//! {{ if expr }} ... {{ else }} ... {{ end }}
//! {{/* comment */}}
//! {{- trims whitespace before the action, -}} after it
//! ```
//!
//! Expressions are integer or string literals, dot fields (`.Aggression`),
//! calls `name arg...` and parenthesized calls. A bare name in argument
//! position is a call without arguments.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use super::value::Value;
use super::{Macro, MacroContext, MacroError};

#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("{template}:{line}: {message}")]
	Syntax {
		template: String,
		line: usize,
		message: String,
	},

	#[error("{template}:{line}: {source}")]
	Macro {
		template: String,
		line: usize,
		#[source]
		source: MacroError,
	},

	#[error("{template}:{line}: no field .{name} in scope")]
	UnknownField {
		template: String,
		line: usize,
		name: String,
	},

	#[error("{template}:{line}: cannot range over {kind}")]
	NotIterable {
		template: String,
		line: usize,
		kind: &'static str,
	},
}

/// Per-request values visible to a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderData {
	/// Escalation level of the requesting client.
	pub aggression: i64,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
	Int(i64),
	Str(String),
	/// `.Name`; an empty name is dot itself.
	Field { name: String, line: usize },
	Call { function: Macro, args: Vec<Expr>, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
	Range,
	With,
	If,
}

impl BlockKind {
	fn keyword(self) -> &'static str {
		match self {
			BlockKind::Range => "range",
			BlockKind::With => "with",
			BlockKind::If => "if",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
	Text(String),
	Output(Expr),
	Block {
		kind: BlockKind,
		expr: Expr,
		line: usize,
		body: Vec<Node>,
		otherwise: Vec<Node>,
	},
}

/// A compiled template, ready to be rendered any number of times.
#[derive(Debug, Clone)]
pub struct Template {
	name: String,
	nodes: Vec<Node>,
}

impl Template {
	/// Parses `source` and resolves every function name and arity.
	///
	/// # Errors
	/// Returns a [`TemplateError`] on malformed syntax, unknown functions or
	/// wrong argument counts.
	pub fn compile(name: &str, source: &str) -> Result<Self, TemplateError> {
		let nodes = Compiler::new(name).compile(source)?;
		Ok(Self { name: name.to_owned(), nodes })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Renders the template, invoking generators through `ctx`.
	pub fn render(&self, ctx: &mut MacroContext<'_>, data: &RenderData) -> Result<String, TemplateError> {
		let mut renderer = Renderer {
			template: &self.name,
			ctx,
			data,
			scopes: vec![Scope::Root],
		};
		let mut out = String::new();
		renderer.render_nodes(&self.nodes, &mut out)?;
		Ok(out)
	}
}

struct Action<'s> {
	body: &'s str,
	line: usize,
	trim_before: bool,
	trim_after: bool,
}

enum Piece<'s> {
	Text(&'s str),
	Action(Action<'s>),
}

/// Finds the `}}` closing an action, skipping over strings and comments.
fn find_action_end(s: &str) -> Option<usize> {
	let bytes = s.as_bytes();
	let mut quote: Option<u8> = None;
	let mut in_comment = false;
	let mut i = 0;

	while i < bytes.len() {
		let rest = &bytes[i..];
		if in_comment {
			if rest.starts_with(b"*/") {
				in_comment = false;
				i += 2;
				continue;
			}
		} else if let Some(q) = quote {
			if q == b'"' && bytes[i] == b'\\' {
				i += 2;
				continue;
			}
			if bytes[i] == q {
				quote = None;
			}
		} else if rest.starts_with(b"}}") {
			return Some(i);
		} else if rest.starts_with(b"/*") {
			in_comment = true;
			i += 2;
			continue;
		} else if bytes[i] == b'"' || bytes[i] == b'`' {
			quote = Some(bytes[i]);
		}
		i += 1;
	}

	None
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
	Ident(String),
	Field(String),
	Int(i64),
	Str(String),
	LParen,
	RParen,
}

fn take_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
	let mut ident = String::new();
	while let Some(&(_, c)) = chars.peek() {
		if !(c.is_alphanumeric() || c == '_') {
			break;
		}
		ident.push(c);
		chars.next();
	}
	ident
}

fn lex(body: &str) -> Result<Vec<Token>, String> {
	let mut tokens = Vec::new();
	let mut chars = body.char_indices().peekable();

	while let Some(&(_, c)) = chars.peek() {
		match c {
			c if c.is_whitespace() => {
				chars.next();
			}
			'(' => {
				chars.next();
				tokens.push(Token::LParen);
			}
			')' => {
				chars.next();
				tokens.push(Token::RParen);
			}
			'"' => {
				chars.next();
				let mut s = String::new();
				loop {
					match chars.next() {
						None => return Err("unterminated string".to_owned()),
						Some((_, '"')) => break,
						Some((_, '\\')) => match chars.next() {
							Some((_, 'n')) => s.push('\n'),
							Some((_, 't')) => s.push('\t'),
							Some((_, c @ ('"' | '\\'))) => s.push(c),
							Some((_, other)) => return Err(format!("unknown escape \\{other}")),
							None => return Err("unterminated string".to_owned()),
						},
						Some((_, c)) => s.push(c),
					}
				}
				tokens.push(Token::Str(s));
			}
			'`' => {
				chars.next();
				let mut s = String::new();
				loop {
					match chars.next() {
						None => return Err("unterminated raw string".to_owned()),
						Some((_, '`')) => break,
						Some((_, c)) => s.push(c),
					}
				}
				tokens.push(Token::Str(s));
			}
			'.' => {
				chars.next();
				tokens.push(Token::Field(take_ident(&mut chars)));
			}
			'-' | '0'..='9' => {
				let mut number = String::new();
				while let Some(&(_, c)) = chars.peek() {
					if !(c.is_ascii_digit() || (c == '-' && number.is_empty())) {
						break;
					}
					number.push(c);
					chars.next();
				}
				let value = number.parse().map_err(|_| format!("bad number {number:?}"))?;
				tokens.push(Token::Int(value));
			}
			c if c.is_alphabetic() || c == '_' => tokens.push(Token::Ident(take_ident(&mut chars))),
			other => return Err(format!("unexpected character {other:?}")),
		}
	}

	Ok(tokens)
}

/// Recursive-descent parser over the tokens of one action.
struct Parser<'c> {
	compiler: &'c Compiler,
	line: usize,
	tokens: Vec<Token>,
	pos: usize,
}

impl Parser<'_> {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).cloned();
		self.pos += 1;
		token
	}

	fn resolve(&self, name: &str, args: usize) -> Result<Macro, TemplateError> {
		let function = name.parse::<Macro>().map_err(|e| self.compiler.macro_error(self.line, e))?;
		function
			.check_arity(args)
			.map_err(|e| self.compiler.macro_error(self.line, e))?;
		Ok(function)
	}

	/// A call with its arguments, or a single operand.
	fn command(&mut self) -> Result<Expr, TemplateError> {
		let first = self
			.advance()
			.ok_or_else(|| self.compiler.syntax(self.line, "missing value"))?;

		let name = match first {
			Token::Ident(name) => name,
			other => return self.operand(other),
		};

		let mut args = Vec::new();
		loop {
			match self.peek() {
				None | Some(Token::RParen) => break,
				_ => {}
			}
			if let Some(token) = self.advance() {
				args.push(self.operand(token)?);
			}
		}

		let function = self.resolve(&name, args.len())?;
		Ok(Expr::Call { function, args, line: self.line })
	}

	fn operand(&mut self, token: Token) -> Result<Expr, TemplateError> {
		match token {
			Token::Int(i) => Ok(Expr::Int(i)),
			Token::Str(s) => Ok(Expr::Str(s)),
			Token::Field(name) => Ok(Expr::Field { name, line: self.line }),
			Token::Ident(name) => {
				let function = self.resolve(&name, 0)?;
				Ok(Expr::Call { function, args: Vec::new(), line: self.line })
			}
			Token::LParen => {
				let expr = self.command()?;
				match self.advance() {
					Some(Token::RParen) => Ok(expr),
					_ => Err(self.compiler.syntax(self.line, "unclosed parenthesis")),
				}
			}
			Token::RParen => Err(self.compiler.syntax(self.line, "unexpected )")),
		}
	}

	/// Parses the whole action as one expression.
	fn expression(mut self) -> Result<Expr, TemplateError> {
		let expr = self.command()?;
		if let Some(token) = self.peek() {
			return Err(self.compiler.syntax(self.line, format!("unexpected {token:?} after expression")));
		}
		Ok(expr)
	}
}

/// An open `range`, `with` or `if` awaiting its `end`.
struct Frame {
	kind: BlockKind,
	expr: Expr,
	line: usize,
	body: Vec<Node>,
	otherwise: Option<Vec<Node>>,
}

impl Frame {
	fn nodes(&mut self) -> &mut Vec<Node> {
		match &mut self.otherwise {
			Some(otherwise) => otherwise,
			None => &mut self.body,
		}
	}
}

struct Compiler {
	template: String,
}

impl Compiler {
	fn new(template: &str) -> Self {
		Self { template: template.to_owned() }
	}

	fn syntax(&self, line: usize, message: impl Into<String>) -> TemplateError {
		TemplateError::Syntax {
			template: self.template.clone(),
			line,
			message: message.into(),
		}
	}

	fn macro_error(&self, line: usize, source: MacroError) -> TemplateError {
		TemplateError::Macro { template: self.template.clone(), line, source }
	}

	/// Splits the source into literal text and actions, applying trim markers.
	fn scan<'s>(&self, source: &'s str) -> Result<Vec<Piece<'s>>, TemplateError> {
		let mut pieces = Vec::new();
		let mut rest = source;
		let mut offset = 0;

		while let Some(start) = rest.find("{{") {
			if start > 0 {
				pieces.push(Piece::Text(&rest[..start]));
			}
			let line = 1 + source[..offset + start].matches('\n').count();
			let after = &rest[start + 2..];
			let end = find_action_end(after).ok_or_else(|| self.syntax(line, "unclosed action"))?;

			let mut body = &after[..end];
			let mut trim_before = false;
			let mut trim_after = false;
			if let Some(stripped) = body.strip_prefix('-') {
				if stripped.starts_with(char::is_whitespace) {
					body = stripped;
					trim_before = true;
				}
			}
			if let Some(stripped) = body.strip_suffix('-') {
				if stripped.ends_with(char::is_whitespace) {
					body = stripped;
					trim_after = true;
				}
			}
			pieces.push(Piece::Action(Action { body: body.trim(), line, trim_before, trim_after }));

			let consumed = start + 2 + end + 2;
			offset += consumed;
			rest = &rest[consumed..];
		}
		if !rest.is_empty() {
			pieces.push(Piece::Text(rest));
		}

		Ok(pieces)
	}

	fn compile(&self, source: &str) -> Result<Vec<Node>, TemplateError> {
		let pieces = self.scan(source)?;
		let mut root: Vec<Node> = Vec::new();
		let mut stack: Vec<Frame> = Vec::new();

		for (i, piece) in pieces.iter().enumerate() {
			let current = match stack.last_mut() {
				Some(frame) => frame.nodes(),
				None => &mut root,
			};

			let action = match piece {
				Piece::Text(text) => {
					let mut text: &str = text;
					if let Some(Piece::Action(prev)) = i.checked_sub(1).and_then(|p| pieces.get(p)) {
						if prev.trim_after {
							text = text.trim_start();
						}
					}
					if let Some(Piece::Action(next)) = pieces.get(i + 1) {
						if next.trim_before {
							text = text.trim_end();
						}
					}
					if !text.is_empty() {
						current.push(Node::Text(text.to_owned()));
					}
					continue;
				}
				Piece::Action(action) => action,
			};

			let line = action.line;
			if let Some(comment) = action.body.strip_prefix("/*") {
				if !comment.ends_with("*/") {
					return Err(self.syntax(line, "unclosed comment"));
				}
				continue;
			}

			let tokens = lex(action.body).map_err(|message| self.syntax(line, message))?;
			let keyword = match tokens.first() {
				Some(Token::Ident(word)) => word.as_str(),
				_ => "",
			};

			match keyword {
				"range" | "with" | "if" => {
					let kind = match keyword {
						"range" => BlockKind::Range,
						"with" => BlockKind::With,
						_ => BlockKind::If,
					};
					let parser = Parser { compiler: self, line, tokens, pos: 1 };
					let expr = parser.expression()?;
					stack.push(Frame { kind, expr, line, body: Vec::new(), otherwise: None });
				}
				"else" => {
					if tokens.len() != 1 {
						return Err(self.syntax(line, "else takes no arguments"));
					}
					match stack.last_mut() {
						Some(frame) if frame.otherwise.is_none() => frame.otherwise = Some(Vec::new()),
						Some(_) => return Err(self.syntax(line, "duplicate else")),
						None => return Err(self.syntax(line, "else outside of a block")),
					}
				}
				"end" => {
					if tokens.len() != 1 {
						return Err(self.syntax(line, "end takes no arguments"));
					}
					let frame = stack.pop().ok_or_else(|| self.syntax(line, "unexpected end"))?;
					let node = Node::Block {
						kind: frame.kind,
						expr: frame.expr,
						line: frame.line,
						body: frame.body,
						otherwise: frame.otherwise.unwrap_or_default(),
					};
					match stack.last_mut() {
						Some(parent) => parent.nodes().push(node),
						None => root.push(node),
					}
				}
				_ => {
					let parser = Parser { compiler: self, line, tokens, pos: 0 };
					let expr = parser.expression()?;
					current.push(Node::Output(expr));
				}
			}
		}

		if let Some(frame) = stack.last() {
			return Err(self.syntax(frame.line, format!("unclosed {}", frame.kind.keyword())));
		}

		Ok(root)
	}
}

/// What dot refers to at some point of the render.
enum Scope {
	Root,
	Item { index: i64, item: Value },
	With(Value),
}

struct Renderer<'r, 'c> {
	template: &'r str,
	ctx: &'r mut MacroContext<'c>,
	data: &'r RenderData,
	scopes: Vec<Scope>,
}

impl Renderer<'_, '_> {
	fn render_nodes(&mut self, nodes: &[Node], out: &mut String) -> Result<(), TemplateError> {
		for node in nodes {
			match node {
				Node::Text(text) => out.push_str(text),
				Node::Output(expr) => self.eval(expr)?.render_into(out),
				Node::Block { kind, expr, line, body, otherwise } => {
					let value = self.eval(expr)?;
					match kind {
						BlockKind::Range => self.render_range(value, *line, body, otherwise, out)?,
						BlockKind::With if value.is_truthy() => {
							self.scopes.push(Scope::With(value));
							let result = self.render_nodes(body, out);
							self.scopes.pop();
							result?;
						}
						BlockKind::If if value.is_truthy() => self.render_nodes(body, out)?,
						BlockKind::With | BlockKind::If => self.render_nodes(otherwise, out)?,
					}
				}
			}
		}
		Ok(())
	}

	fn render_range(
		&mut self,
		value: Value,
		line: usize,
		body: &[Node],
		otherwise: &[Node],
		out: &mut String,
	) -> Result<(), TemplateError> {
		let items: Vec<Value> = match value {
			Value::Int(count) => (0..count.max(0)).map(Value::Int).collect(),
			Value::List(items) => items,
			other => {
				return Err(TemplateError::NotIterable {
					template: self.template.to_owned(),
					line,
					kind: other.type_name(),
				});
			}
		};

		if items.is_empty() {
			return self.render_nodes(otherwise, out);
		}

		for (index, item) in items.into_iter().enumerate() {
			self.scopes.push(Scope::Item { index: index as i64, item });
			let result = self.render_nodes(body, out);
			self.scopes.pop();
			result?;
		}
		Ok(())
	}

	fn eval(&mut self, expr: &Expr) -> Result<Value, TemplateError> {
		match expr {
			Expr::Int(i) => Ok(Value::Int(*i)),
			Expr::Str(s) => Ok(Value::Text(s.clone())),
			Expr::Field { name, line } => self.lookup(name, *line),
			Expr::Call { function, args, line } => {
				let values = args
					.iter()
					.map(|arg| self.eval(arg))
					.collect::<Result<Vec<_>, _>>()?;
				function.call(self.ctx, values).map_err(|source| TemplateError::Macro {
					template: self.template.to_owned(),
					line: *line,
					source,
				})
			}
		}
	}

	/// Resolves a field from the innermost scope outward.
	fn lookup(&self, name: &str, line: usize) -> Result<Value, TemplateError> {
		if name.is_empty() {
			return Ok(match self.scopes.last() {
				Some(Scope::Item { item, .. }) => item.clone(),
				Some(Scope::With(value)) => value.clone(),
				Some(Scope::Root) | None => Value::Int(self.data.aggression),
			});
		}

		for scope in self.scopes.iter().rev() {
			let found = match (scope, name) {
				(Scope::Item { index, .. }, "Index") => Some(Value::Int(*index)),
				(Scope::Item { item, .. }, "Item") => Some(item.clone()),
				(Scope::With(value), _) => value.field(name),
				(Scope::Root, "Aggression") => Some(Value::Int(self.data.aggression)),
				_ => None,
			};
			if let Some(value) = found {
				return Ok(value);
			}
		}

		Err(TemplateError::UnknownField {
			template: self.template.to_owned(),
			line,
			name: name.to_owned(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::generators::content::LinkSettings;
	use crate::generators::corpus::WordCorpus;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn render_with(source: &str, aggression: i64) -> Result<String, TemplateError> {
		let template = Template::compile("test", source)?;
		let mut rng = StdRng::seed_from_u64(7);
		let corpus = WordCorpus::embedded();
		let links = LinkSettings::default();
		let mut ctx = MacroContext { rng: &mut rng, corpus: &corpus, model: None, links: &links };
		template.render(&mut ctx, &RenderData { aggression })
	}

	fn render(source: &str) -> String {
		render_with(source, 0).unwrap()
	}

	#[test]
	fn plain_text_passes_through() {
		assert_eq!(render("<p>hello</p>"), "<p>hello</p>");
		assert_eq!(render(""), "");
	}

	#[test]
	fn literals_and_arithmetic() {
		assert_eq!(render("{{ 42 }}"), "42");
		assert_eq!(render("{{ add 2 (mult 3 4) }}"), "14");
		assert_eq!(render("{{ sub 1 -3 }}"), "4");
		assert_eq!(render("{{ \"a<b\" }}"), "a&lt;b");
		assert_eq!(render("{{ `raw \"x\"` }}"), "raw &quot;x&quot;");
	}

	#[test]
	fn aggression_is_visible_everywhere() {
		assert_eq!(render_with("{{ .Aggression }}", 3).unwrap(), "3");
		assert_eq!(render_with("{{ . }}", 2).unwrap(), "2");
		assert_eq!(render_with("{{ range 2 }}{{ .Aggression }}{{ end }}", 5).unwrap(), "55");
	}

	#[test]
	fn range_over_counts_and_lists() {
		assert_eq!(render("{{ range 3 }}[{{ .Index }}]{{ end }}"), "[0][1][2]");
		assert_eq!(render("{{ range repeat 2 }}{{ . }}{{ end }}"), "01");
		assert_eq!(render("{{ range list \"a\" \"b\" }}{{ .Index }}={{ .Item }} {{ end }}"), "0=a 1=b ");
		assert_eq!(render("{{ range 0 }}x{{ else }}none{{ end }}"), "none");
		assert_eq!(
			render("{{ range 2 }}{{ range 2 }}{{ .Index }}{{ end }};{{ end }}"),
			"01;01;"
		);
	}

	#[test]
	fn with_binds_style_block() {
		let html = render("{{ with randomStyleBlock \"utility\" 2 }}{{ .Style }}<div class=\"{{ .Class }}\"></div>{{ end }}");
		assert!(html.starts_with("<style>"));
		let class_start = html.find("<div class=\"p").unwrap() + "<div class=\"".len();
		let class = &html[class_start..class_start + 13];
		assert!(html.contains(&format!(".{class} .u")));
	}

	#[test]
	fn conditionals() {
		assert_eq!(render_with("{{ if .Aggression }}angry{{ else }}calm{{ end }}", 0).unwrap(), "calm");
		assert_eq!(render_with("{{ if .Aggression }}angry{{ else }}calm{{ end }}", 1).unwrap(), "angry");
		assert_eq!(render("{{ with \"\" }}x{{ else }}empty{{ end }}"), "empty");
	}

	#[test]
	fn comments_and_trim_markers() {
		assert_eq!(render("a{{/* hidden }} */}}b"), "ab");
		assert_eq!(render("a  {{- 1 -}}  \n b"), "a1b");
		assert_eq!(render("a {{ 1 }} b"), "a 1 b");
	}

	#[test]
	fn strings_may_contain_braces() {
		assert_eq!(render("{{ \"}}\" }}"), "}}");
	}

	#[test]
	fn bare_names_are_zero_argument_calls() {
		let color = render("{{ randomChoice (list randomColor randomColor) }}");
		assert_eq!(color.len(), 7);
		assert!(color.starts_with('#'));
	}

	#[test]
	fn markup_is_not_escaped() {
		let html = render("{{ nestDivs 2 }}");
		assert_eq!(html.matches("<div").count(), 2);
	}

	#[test]
	fn compile_errors() {
		assert!(matches!(
			Template::compile("t", "{{ printf 1 }}"),
			Err(TemplateError::Macro { source: MacroError::Unknown(_), .. })
		));
		assert!(matches!(
			Template::compile("t", "\n{{ nestDivs }}"),
			Err(TemplateError::Macro { line: 2, source: MacroError::Arity { .. }, .. })
		));
		assert!(matches!(
			Template::compile("t", "{{ add 1 randomWord 2 }}"),
			Err(TemplateError::Macro { source: MacroError::Arity { got: 3, .. }, .. })
		));
		for source in [
			"{{ range 3 }}",
			"{{ end }}",
			"{{ 1",
			"{{ \"open }}",
			"{{ (add 1 2 }}",
			"{{ add 1 2) }}",
			"{{ 1 2 }}",
			"{{ else }}",
			"{{ if 1 }}{{ else }}{{ else }}{{ end }}",
			"{{ # }}",
			"{{ /* open }}",
		] {
			assert!(
				matches!(Template::compile("t", source), Err(TemplateError::Syntax { .. })),
				"{source}"
			);
		}
	}

	#[test]
	fn render_errors() {
		assert!(matches!(
			render_with("{{ nestDivs \"x\" }}", 0),
			Err(TemplateError::Macro { source: MacroError::ArgumentType { .. }, .. })
		));
		assert!(matches!(
			render_with("{{ randomJSON -1 2 2 }}", 0),
			Err(TemplateError::Macro { source: MacroError::Generation { .. }, .. })
		));
		assert!(matches!(
			render_with("{{ .Missing }}", 0),
			Err(TemplateError::UnknownField { .. })
		));
		assert!(matches!(
			render_with("{{ range \"abc\" }}{{ end }}", 0),
			Err(TemplateError::NotIterable { kind: "text", .. })
		));
	}
}
