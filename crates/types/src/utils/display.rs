use std::fmt;

pub fn format_separated<'a, I>(i: &'a [I], separator: &'a str) -> Separated<'a, I> {
	Separated {
		items: i,
		separator,
	}
}

/// Displays a slice of items joined by a separator.
pub struct Separated<'a, I> {
	items: &'a [I],
	separator: &'a str,
}

impl<I> fmt::Display for Separated<'_, I>
where
	I: fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, i) in self.items.iter().enumerate() {
			if idx != 0 {
				f.write_str(self.separator)?;
			}
			i.fmt(f)?;
		}
		Ok(())
	}
}
