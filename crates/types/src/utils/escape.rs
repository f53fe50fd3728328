use std::fmt;
use std::str::Chars;

/// Backslash-escapes the quote character and backslashes of a string.
#[derive(Clone)]
pub struct Escape<'a> {
	chars: Chars<'a>,
	pending: Option<char>,
	escape_char: char,
}

impl<'a> Escape<'a> {
	pub fn escape_str(s: &'a str, escape_char: char) -> Self {
		Escape {
			chars: s.chars(),
			pending: None,
			escape_char,
		}
	}
}

impl Iterator for Escape<'_> {
	type Item = String;

	fn next(&mut self) -> Option<String> {
		if let Some(x) = self.pending.take() {
			return Some(x.to_string());
		}
		let next = self.chars.next()?;
		match next {
			'\n' => Some("\\n".to_string()),
			'\r' => Some("\\r".to_string()),
			'\t' => Some("\\t".to_string()),
			x if x == self.escape_char || x == '\\' => {
				self.pending = Some(x);
				Some("\\".to_string())
			}
			x => Some(x.to_string()),
		}
	}
}

impl fmt::Display for Escape<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for x in self.clone() {
			f.write_str(&x)?;
		}
		Ok(())
	}
}

/// Renders a string as a double-quoted SQL string literal.
pub struct QuoteStr<'a>(pub &'a str);

impl fmt::Display for QuoteStr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!("\"{}\"", Escape::escape_str(self.0, '"')))
	}
}

/// Renders an identifier, backquoting it when it is not a plain identifier.
pub struct EscapeIdent<'a>(pub &'a str);

impl fmt::Display for EscapeIdent<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = self.0;
		// Empty, starts with a digit, or any non 'normal' characters?
		if s.is_empty()
			|| s.starts_with(|x: char| x.is_ascii_digit())
			|| s.contains(|x: char| !x.is_ascii_alphanumeric() && x != '_')
		{
			return f.write_fmt(format_args!("`{}`", Escape::escape_str(s, '`')));
		}
		f.write_str(s)
	}
}

/// Renders a byte string as a `b"..."` SQL literal.
pub struct QuoteBytes<'a>(pub &'a [u8]);

impl fmt::Display for QuoteBytes<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("b\"")?;
		for b in self.0 {
			match b {
				b'"' => f.write_str("\\\"")?,
				b'\\' => f.write_str("\\\\")?,
				0x20..=0x7e => fmt::Write::write_char(f, *b as char)?,
				_ => write!(f, "\\x{b:02x}")?,
			}
		}
		f.write_str("\"")
	}
}
