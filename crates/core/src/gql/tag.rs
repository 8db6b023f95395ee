/// A field annotation in the conventional `key:"value" other:"value"` layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
	entries: Vec<(String, String)>,
}

impl Tag {
	/// Parses a tag string. Parsing stops at the first malformed pair, keeping
	/// the pairs read so far.
	pub fn parse(raw: &str) -> Self {
		let mut entries = Vec::new();
		let mut rest = raw;
		loop {
			rest = rest.trim_start_matches(' ');
			if rest.is_empty() {
				break;
			}
			let key_len = rest
				.find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
				.unwrap_or(rest.len());
			if key_len == 0 || !rest[key_len..].starts_with(":\"") {
				break;
			}
			let key = &rest[..key_len];
			let body = &rest[key_len + 2..];
			let mut value = String::new();
			let mut end = None;
			let mut chars = body.char_indices();
			while let Some((i, c)) = chars.next() {
				match c {
					'"' => {
						end = Some(i);
						break;
					}
					'\\' => match chars.next() {
						Some((_, 'n')) => value.push('\n'),
						Some((_, 't')) => value.push('\t'),
						Some((_, escaped)) => value.push(escaped),
						None => break,
					},
					c => value.push(c),
				}
			}
			let Some(end) = end else {
				break;
			};
			entries.push((key.to_owned(), value));
			rest = &body[end + 1..];
		}
		Self {
			entries,
		}
	}

	/// Returns the raw value of the first pair with this key.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// Returns the name part of a value, the segment before the first comma.
	/// An empty name counts as absent.
	pub fn name(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(|v| v.split(',').next()).filter(|n| !n.is_empty())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl From<&str> for Tag {
	fn from(raw: &str) -> Self {
		Tag::parse(raw)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(r#"gql:"price""#, "gql", Some("price"))]
	#[case(r#"gql:"price,omitempty""#, "gql", Some("price"))]
	#[case(r#"json:"p" gql:"price""#, "gql", Some("price"))]
	#[case(r#"json:"p"  root:"flag""#, "root", Some("flag"))]
	#[case(r#"gql:"""#, "gql", None)]
	#[case(r#"gql:",omitempty""#, "gql", None)]
	#[case(r#"json:"p""#, "gql", None)]
	#[case("", "gql", None)]
	#[case(r#"gql:"unterminated"#, "gql", None)]
	#[case(r#"bad key:"x" gql:"y""#, "gql", None)]
	fn tag_names(#[case] raw: &str, #[case] key: &str, #[case] expected: Option<&str>) {
		assert_eq!(Tag::parse(raw).name(key), expected);
	}

	#[test]
	fn tag_escapes() {
		let tag = Tag::parse(r#"gql:"a\"b" root:"c""#);
		assert_eq!(tag.get("gql"), Some("a\"b"));
		assert_eq!(tag.get("root"), Some("c"));
	}

	#[test]
	fn first_pair_wins() {
		let tag = Tag::parse(r#"gql:"first" gql:"second""#);
		assert_eq!(tag.name("gql"), Some("first"));
	}
}
