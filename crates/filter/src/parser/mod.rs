//! # Parser
//!
//! Recursive descent parser for filter strings such as `(&(objectClass=ITodo)(p=Run1))`.
//!
//! ## Supported Syntax
//!
//! ```text
//! filter = "(" body ")"
//! body   = "&" filter+ | "|" filter+ | "!" filter | item
//! item   = attr "=" value | attr "=*"
//! attr   = any chars except "(" ")" "=" "<" ">" "~"
//! value  = ( char | "\" char )*
//! ```
//!
//! Whitespace is allowed between filters and around attribute names. Substring
//! (`(a=x*y)`), approximate (`~=`) and ordering (`<=`, `>=`) items are rejected.

use crate::ast::Filter;


/// Represents an error that occurred during parsing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

impl std::fmt::Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "filter parse error at position {}: {}", self.position, self.message)
	}
}

impl std::error::Error for ParseError {}

/// Parser state: the unconsumed tail of the input and its byte offset.
struct Parser<'a> {
	input: &'a str,
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	fn next(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		self.input = &self.input[ch.len_utf8()..];
		Some(ch)
	}

	/// Consumes the next character if it matches the expected one.
	fn take(&mut self, expected: char) -> Result<(), ParseError> {
		match self.next() {
			Some(ch) if ch == expected => Ok(()),
			Some(ch) => Err(ParseError {
				message: format!("expected '{expected}', found '{ch}'"),
				position: self.position - ch.len_utf8(),
			}),
			None => Err(self.error(format!("expected '{expected}', found end of input"))),
		}
	}

	fn take_while<F>(&mut self, predicate: F) -> &'a str
	where
		F: Fn(char) -> bool,
	{
		let len = self.input.find(|ch| !predicate(ch)).unwrap_or(self.input.len());
		let (taken, rest) = self.input.split_at(len);
		self.input = rest;
		self.position += len;
		taken
	}

	fn skip_whitespace(&mut self) {
		self.take_while(char::is_whitespace);
	}

	fn error(&self, message: String) -> ParseError {
		ParseError {
			message,
			position: self.position,
		}
	}
}

/// Parses a filter string into a [`Filter`].
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the first offending byte if the input does not
/// match the grammar or uses an unsupported operator.
pub fn parse(input: &str) -> Result<Filter, ParseError> {
	let mut parser = Parser::new(input);
	parser.skip_whitespace();
	let filter = parse_filter(&mut parser)?;
	parser.skip_whitespace();

	if let Some(ch) = parser.peek() {
		return Err(parser.error(format!("expected end of input, found '{ch}'")));
	}

	Ok(filter)
}

/// Grammar: `filter = "(" body ")"`
fn parse_filter(parser: &mut Parser) -> Result<Filter, ParseError> {
	parser.take('(')?;
	parser.skip_whitespace();

	let filter = match parser.peek() {
		Some('&') => {
			parser.next();
			Filter::And(parse_operands(parser, '&')?)
		}
		Some('|') => {
			parser.next();
			Filter::Or(parse_operands(parser, '|')?)
		}
		Some('!') => {
			parser.next();
			parser.skip_whitespace();
			Filter::Not(Box::new(parse_filter(parser)?))
		}
		Some(_) => parse_item(parser)?,
		None => return Err(parser.error("expected filter body, found end of input".to_string())),
	};

	parser.skip_whitespace();
	parser.take(')')?;
	Ok(filter)
}

fn parse_operands(parser: &mut Parser, operator: char) -> Result<Vec<Filter>, ParseError> {
	let mut operands = Vec::new();
	loop {
		parser.skip_whitespace();
		if parser.peek() != Some('(') {
			break;
		}
		operands.push(parse_filter(parser)?);
	}

	if operands.is_empty() {
		return Err(parser.error(format!("'{operator}' requires at least one operand")));
	}
	Ok(operands)
}

/// Grammar: `item = attr "=" value | attr "=*"`
fn parse_item(parser: &mut Parser) -> Result<Filter, ParseError> {
	let start = parser.position;
	let attr = parser.take_while(|ch| !matches!(ch, '(' | ')' | '=' | '<' | '>' | '~')).trim();
	if attr.is_empty() {
		return Err(ParseError {
			message: "missing attribute name".to_string(),
			position: start,
		});
	}

	match parser.peek() {
		Some('=') => {
			parser.next();
		}
		Some(op @ ('<' | '>' | '~')) => {
			return Err(parser.error(format!("unsupported operator '{op}='")));
		}
		Some(ch) => return Err(parser.error(format!("expected '=', found '{ch}'"))),
		None => return Err(parser.error("expected '=', found end of input".to_string())),
	}

	parse_value(parser, attr.to_string())
}

/// Reads an item value up to the closing parenthesis, resolving escapes.
fn parse_value(parser: &mut Parser, attr: String) -> Result<Filter, ParseError> {
	let mut value = String::new();
	let mut first_wildcard = None;
	let mut wildcards = 0usize;

	loop {
		match parser.peek() {
			None | Some(')') => break,
			Some('\\') => {
				parser.next();
				match parser.next() {
					Some(ch) => value.push(ch),
					None => return Err(parser.error("dangling escape at end of input".to_string())),
				}
			}
			Some('*') => {
				first_wildcard.get_or_insert(parser.position);
				wildcards += 1;
				parser.next();
			}
			Some('(') => return Err(parser.error("unescaped '(' in value".to_string())),
			Some(ch) => {
				value.push(ch);
				parser.next();
			}
		}
	}

	match first_wildcard {
		None => Ok(Filter::Equal { attr, value }),
		Some(_) if wildcards == 1 && value.is_empty() => Ok(Filter::Present(attr)),
		Some(position) => Err(ParseError {
			message: format!("substring matching is not supported for attribute '{attr}'"),
			position,
		}),
	}
}
