//! Procfile command lines to argument vectors.
//!
//! A declaration's command is tokenized with `sh` word-splitting and quoting
//! rules, with one twist: outside quotes a backslash is only an escape when it
//! protects a space or a quote character. Every other unquoted backslash is
//! kept literally, so `C:\tmp` and `a\ b` both survive. Quoted spans follow
//! `sh` exactly. [`encode`] rewrites the raw text so a standard `sh`
//! tokenizer ([`decode`]) yields exactly those words.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};

/// Doubles every unquoted backslash that does not escape a space or a quote.
/// Quoted spans are copied as they are.
pub fn encode(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len() + 8);
	let mut chars = raw.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'\\' => match chars.peek() {
				Some(&next) if matches!(next, ' ' | '\'' | '"') => {
					chars.next();
					out.push('\\');
					out.push(next);
				}
				_ => out.push_str("\\\\"),
			},
			'\'' => {
				out.push(c);
				copy_single_quoted(&mut chars, &mut out);
			}
			'"' => {
				out.push(c);
				copy_double_quoted(&mut chars, &mut out);
			}
			_ => out.push(c),
		}
	}
	out
}

fn copy_single_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
	for c in chars.by_ref() {
		out.push(c);
		if c == '\'' {
			return;
		}
	}
}

fn copy_double_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
	while let Some(c) = chars.next() {
		out.push(c);
		match c {
			'\\' => {
				if let Some(escaped) = chars.next() {
					out.push(escaped);
				}
			}
			'"' => return,
			_ => {}
		}
	}
}

/// Splits an encoded command into words using `sh` quoting rules.
pub fn decode(encoded: &str) -> std::result::Result<Vec<String>, shell_words::ParseError> {
	shell_words::split(encoded)
}

/// Tokenizes a raw command for the process called `name`.
pub fn tokenize(name: &str, raw: &str) -> Result<Vec<String>> {
	parse_encoded(name, &encode(raw))
}

pub(crate) fn parse_encoded(name: &str, encoded: &str) -> Result<Vec<String>> {
	let words = decode(encoded).map_err(|e| Error::BadCommand {
		name: name.to_string(),
		reason: e.to_string(),
	})?;
	if words.is_empty() {
		return Err(Error::EmptyCommand(name.to_string()));
	}
	Ok(words)
}

/// Quotes words back into a single line, for diagnostics.
pub fn join(words: &[String]) -> String {
	shell_words::join(words)
}
