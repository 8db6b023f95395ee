//! Naming conventions which turn declared fields and prefixed methods into
//! the members of an object type.

use super::dispatch::MethodDef;
use super::error::GqlError;
use super::ext::{Named, NamedContainer};
use super::object::StructField;
use crate::cnf::Config;

/// Converts a name to lower camel case.
///
/// Separators (`_`, `-`, `.` and spaces) are dropped and capitalize the next
/// letter, as does a preceding digit. A run of capitals is treated as one
/// word, so `ID` becomes `id` and `HTTPServer` becomes `httpServer`.
pub fn lower_camel(name: &str) -> String {
	let chars: Vec<char> = name.trim().chars().collect();
	let mut out = String::with_capacity(chars.len());
	let mut cap_next = false;
	for (i, &c) in chars.iter().enumerate() {
		if c.is_ascii_alphabetic() {
			let c = if out.is_empty() {
				c.to_ascii_lowercase()
			} else if cap_next {
				c.to_ascii_uppercase()
			} else if c.is_ascii_uppercase() {
				let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
				let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
				if prev_upper && !next_lower {
					c.to_ascii_lowercase()
				} else {
					c
				}
			} else {
				c
			};
			out.push(c);
			cap_next = false;
		} else if c.is_ascii_digit() {
			out.push(c);
			cap_next = true;
		} else {
			cap_next = matches!(c, '_' | '-' | '.' | ' ');
		}
	}
	out
}

/// A field of an object type, after the naming conventions are applied.
pub enum Member<'a> {
	/// A tagged field read straight from the struct.
	Field {
		name: String,
		field: &'a StructField,
	},
	/// A tagged field whose type and value come from its prefixed method.
	Override {
		name: String,
		field: &'a StructField,
		method: &'a MethodDef,
	},
	/// A prefixed method with no tagged field of its own.
	Synthetic {
		name: String,
		method: &'a MethodDef,
	},
}

impl Named for Member<'_> {
	fn name(&self) -> &str {
		match self {
			Member::Field {
				name,
				..
			}
			| Member::Override {
				name,
				..
			}
			| Member::Synthetic {
				name,
				..
			} => name,
		}
	}
}

/// Resolves the members of the object `owner`.
///
/// Every tagged field becomes a member named by its schema key, replaced by
/// the method named `prefix + field name` when one exists. Every other
/// method becomes a synthetic member named by the camel-cased remainder of
/// its name. Methods without the prefix, and two members sharing a name, are
/// rejected.
pub fn resolve_members<'a>(
	owner: &str,
	fields: &'a [StructField],
	methods: &'a [MethodDef],
	config: &Config,
) -> Result<Vec<Member<'a>>, GqlError> {
	let prefix = config.method_prefix.as_str();
	if let Some(method) = methods.iter().find(|m| !m.name().starts_with(prefix)) {
		return Err(GqlError::InvalidMethod {
			owner: owner.to_owned(),
			method: method.name().to_owned(),
			prefix: prefix.to_owned(),
		});
	}

	let mut members: Vec<Member<'a>> = Vec::with_capacity(fields.len() + methods.len());
	let mut claimed = vec![false; methods.len()];
	let mut push = |members: &mut Vec<Member<'a>>, member: Member<'a>| {
		if members.contains_name(member.name()) {
			return Err(GqlError::DuplicateField {
				owner: owner.to_owned(),
				field: member.name().to_owned(),
			});
		}
		members.push(member);
		Ok(())
	};

	for field in fields {
		let Some(key) = field.tag.name(&config.graph_key_tag) else {
			trace!(owner, field = %field.name, "skipping untagged field");
			continue;
		};
		let target = format!("{prefix}{}", field.name);
		let member = match methods.iter().position(|m| m.name() == target) {
			Some(i) => {
				claimed[i] = true;
				Member::Override {
					name: key.to_owned(),
					field,
					method: &methods[i],
				}
			}
			None => Member::Field {
				name: key.to_owned(),
				field,
			},
		};
		push(&mut members, member)?;
	}

	for (method, claimed) in methods.iter().zip(claimed) {
		if claimed {
			continue;
		}
		let name = lower_camel(&method.name()[prefix.len()..]);
		push(&mut members, Member::Synthetic {
			name,
			method,
		})?;
	}

	Ok(members)
}

#[cfg(test)]
mod tests {
	use async_graphql::Context;
	use rstest::rstest;

	use super::*;
	use crate::gql::object::{GraphObject, ObjectDef, ObjectDescriptor};

	#[rstest]
	#[case("PriceInteger", "priceInteger")]
	#[case("Products", "products")]
	#[case("ID", "id")]
	#[case("UserID", "userId")]
	#[case("HTTPServer", "httpServer")]
	#[case("JSON2", "json2")]
	#[case("price_integer", "priceInteger")]
	#[case("price-integer", "priceInteger")]
	#[case("already", "already")]
	#[case("_leading", "leading")]
	#[case("v2beta", "v2Beta")]
	#[case("", "")]
	fn lower_camel_cases(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(lower_camel(input), expected);
	}

	#[allow(dead_code)]
	struct Listing {
		title: String,
		price: f64,
		stock: i32,
		hidden: bool,
	}

	impl Listing {
		fn price(&self, _: &Context<'_>) -> Result<String, String> {
			Ok(format!("{:.2}", self.price))
		}

		fn discount(&self, _: &Context<'_>) -> Result<f64, String> {
			Ok(self.price * 0.9)
		}

		fn hidden(&self, _: &Context<'_>) -> Result<bool, String> {
			Ok(self.hidden)
		}
	}

	impl GraphObject for Listing {
		fn define(def: &mut ObjectDef<Self>) {
			def.field("Title", r#"gql:"title""#, |l| &l.title)
				.field("Price", r#"gql:"price""#, |l| &l.price)
				.field("Stock", r#"gql:"stock""#, |l| &l.stock)
				.field("Hidden", "", |l| &l.hidden)
				.method("GGL_Price", Listing::price)
				.method("GGL_Discount", Listing::discount)
				.method("GGL_Hidden", Listing::hidden);
		}
	}

	#[test]
	fn members_are_fields_plus_synthetic_methods() {
		let object = ObjectDescriptor::of::<Listing>();
		let members =
			resolve_members("Listing", object.fields(), object.methods(), &Config::default()).unwrap();
		let names: Vec<_> = members.iter().map(|m| m.name()).collect();
		// three tagged fields plus two synthetic methods
		assert_eq!(names, vec!["title", "price", "stock", "discount", "hidden"]);
		assert!(matches!(members[0], Member::Field { .. }));
		assert!(matches!(members[1], Member::Override { .. }));
		assert!(matches!(members[3], Member::Synthetic { .. }));
		assert!(matches!(members[4], Member::Synthetic { .. }));
	}

	#[test]
	fn unprefixed_methods_are_rejected() {
		struct Odd;
		impl GraphObject for Odd {
			fn define(def: &mut ObjectDef<Self>) {
				def.method("Stock", |_: &Odd, _: &Context<'_>| Ok::<_, String>(1));
			}
		}
		let object = ObjectDescriptor::of::<Odd>();
		let err = resolve_members("Odd", object.fields(), object.methods(), &Config::default())
			.err()
			.unwrap();
		assert!(matches!(err, GqlError::InvalidMethod { .. }));
	}

	#[test]
	fn synthetic_names_must_not_shadow_fields() {
		struct Shadow {
			stock: i32,
		}
		impl GraphObject for Shadow {
			fn define(def: &mut ObjectDef<Self>) {
				def.field("Count", r#"gql:"stock""#, |s| &s.stock)
					.method("GGL_Stock", |s: &Shadow, _: &Context<'_>| Ok::<_, String>(s.stock));
			}
		}
		let object = ObjectDescriptor::of::<Shadow>();
		let err = resolve_members("Shadow", object.fields(), object.methods(), &Config::default())
			.err()
			.unwrap();
		assert!(matches!(err, GqlError::DuplicateField { .. }));
	}

	#[test]
	fn the_prefix_is_configurable() {
		let config = Config {
			method_prefix: "Resolve".to_owned(),
			..Config::default()
		};
		let object = ObjectDescriptor::of::<Listing>();
		let err = resolve_members("Listing", object.fields(), object.methods(), &config).err().unwrap();
		assert!(matches!(err, GqlError::InvalidMethod { .. }));
	}
}
