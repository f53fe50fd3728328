use std::fmt;

/// One of the five independent template binding variables of a signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Slot {
	T1,
	T2,
	T3,
	T4,
	T5,
}

impl Slot {
	pub const ALL: [Slot; 5] = [Slot::T1, Slot::T2, Slot::T3, Slot::T4, Slot::T5];

	/// The 1-based number of this slot.
	pub fn number(self) -> u8 {
		match self {
			Slot::T1 => 1,
			Slot::T2 => 2,
			Slot::T3 => 3,
			Slot::T4 => 4,
			Slot::T5 => 5,
		}
	}

	fn index(self) -> usize {
		usize::from(self.number() - 1)
	}
}

impl fmt::Display for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "T{}", self.number())
	}
}

/// A template variable that a kind binds or reads.
///
/// Proto map keys and values bind independently of the numbered slots.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Binding {
	Slot(Slot),
	ProtoMapKey,
	ProtoMapValue,
}

/// The kind of an argument or result position.
///
/// `Fixed` positions carry a concrete type. Every other kind is either a
/// template placeholder bound by matching a call's arguments, or a special
/// purpose non-scalar kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Kind {
	Fixed,
	/// A scalar template, `T1` to `T5`.
	Any(Slot),
	/// An array whose element is the given scalar template.
	Array(Slot),
	/// `MAP<T1, T2>`.
	Map,
	/// `RANGE<T1>`.
	Range,
	/// `MEASURE<T1>`.
	Measure,
	ProtoMap,
	ProtoMapKey,
	ProtoMapValue,
	Proto,
	Struct,
	Enum,
	/// Matches anything and binds nothing.
	Arbitrary,
	Void,
	Relation,
	Model,
	Connection,
	Descriptor,
	Sequence,
	GraphNode,
	GraphEdge,
	GraphElement,
	GraphPath,
	/// A function-type argument.
	Lambda,
}

/// Static properties of a kind.
///
/// Every per-kind property lives in this one table, so a new kind only needs
/// one new row in [`Kind::info`].
#[derive(Clone, Copy, Debug)]
pub struct KindInfo {
	/// Stable numeric code used in persisted records.
	pub code: u8,
	/// The debug name, for example `<array<T1>>`.
	pub name: &'static str,
	/// The user-facing name with template details, for example `ARRAY<T1>`.
	pub display: &'static str,
	/// The user-facing name without template details, for example `ARRAY`.
	pub display_plain: &'static str,
	/// The template variables this kind binds.
	pub binds: &'static [Binding],
	/// Whether this kind is a container of a template variable.
	pub container: bool,
	/// Whether an optional argument of this kind may carry a default value.
	pub default_allowed: bool,
	/// Whether this kind describes a scalar value.
	pub scalar: bool,
}

const ANY_NAMES: [&str; 5] = ["<T1>", "<T2>", "<T3>", "<T4>", "<T5>"];
const ANY_DISPLAY: [&str; 5] = ["T1", "T2", "T3", "T4", "T5"];
const ARRAY_NAMES: [&str; 5] =
	["<array<T1>>", "<array<T2>>", "<array<T3>>", "<array<T4>>", "<array<T5>>"];
const ARRAY_DISPLAY: [&str; 5] = ["ARRAY<T1>", "ARRAY<T2>", "ARRAY<T3>", "ARRAY<T4>", "ARRAY<T5>"];
static SLOT_BINDS: [[Binding; 1]; 5] = [
	[Binding::Slot(Slot::T1)],
	[Binding::Slot(Slot::T2)],
	[Binding::Slot(Slot::T3)],
	[Binding::Slot(Slot::T4)],
	[Binding::Slot(Slot::T5)],
];

#[allow(clippy::too_many_arguments)]
const fn row(
	code: u8,
	name: &'static str,
	display: &'static str,
	display_plain: &'static str,
	binds: &'static [Binding],
	container: bool,
	default_allowed: bool,
	scalar: bool,
) -> KindInfo {
	KindInfo {
		code,
		name,
		display,
		display_plain,
		binds,
		container,
		default_allowed,
		scalar,
	}
}

impl Kind {
	/// Every kind, in code order.
	pub const ALL: [Kind; 32] = [
		Kind::Fixed,
		Kind::Any(Slot::T1),
		Kind::Any(Slot::T2),
		Kind::Any(Slot::T3),
		Kind::Any(Slot::T4),
		Kind::Any(Slot::T5),
		Kind::Array(Slot::T1),
		Kind::Array(Slot::T2),
		Kind::Array(Slot::T3),
		Kind::Array(Slot::T4),
		Kind::Array(Slot::T5),
		Kind::ProtoMap,
		Kind::ProtoMapKey,
		Kind::ProtoMapValue,
		Kind::Proto,
		Kind::Struct,
		Kind::Enum,
		Kind::Arbitrary,
		Kind::Void,
		Kind::Relation,
		Kind::Model,
		Kind::Connection,
		Kind::Descriptor,
		Kind::Lambda,
		Kind::Range,
		Kind::GraphNode,
		Kind::GraphEdge,
		Kind::GraphElement,
		Kind::GraphPath,
		Kind::Sequence,
		Kind::Measure,
		Kind::Map,
	];

	pub fn info(self) -> KindInfo {
		const NONE: &[Binding] = &[];
		const T1: &[Binding] = &[Binding::Slot(Slot::T1)];
		match self {
			Kind::Fixed => row(0, "FIXED", "FIXED", "FIXED", NONE, false, true, true),
			Kind::Any(s) => row(
				s.number(),
				ANY_NAMES[s.index()],
				ANY_DISPLAY[s.index()],
				"ANY",
				&SLOT_BINDS[s.index()],
				false,
				true,
				true,
			),
			Kind::Array(s) => row(
				5 + s.number(),
				ARRAY_NAMES[s.index()],
				ARRAY_DISPLAY[s.index()],
				"ARRAY",
				&SLOT_BINDS[s.index()],
				true,
				true,
				true,
			),
			Kind::ProtoMap => row(
				11,
				"<proto_map<proto_K, proto_V>>",
				"PROTO_MAP",
				"PROTO_MAP",
				&[Binding::ProtoMapKey, Binding::ProtoMapValue],
				true,
				true,
				true,
			),
			Kind::ProtoMapKey => row(
				12,
				"<proto_K>",
				"PROTO_MAP_KEY",
				"PROTO_MAP_KEY",
				&[Binding::ProtoMapKey],
				false,
				true,
				true,
			),
			Kind::ProtoMapValue => row(
				13,
				"<proto_V>",
				"PROTO_MAP_VALUE",
				"PROTO_MAP_VALUE",
				&[Binding::ProtoMapValue],
				false,
				true,
				true,
			),
			Kind::Proto => row(14, "<proto>", "PROTO", "PROTO", NONE, false, true, true),
			Kind::Struct => row(15, "<struct>", "STRUCT", "STRUCT", NONE, false, true, true),
			Kind::Enum => row(16, "<enum>", "ENUM", "ENUM", NONE, false, true, true),
			Kind::Arbitrary => row(17, "<arbitrary>", "ANY", "ANY", NONE, false, true, true),
			Kind::Void => row(18, "<void>", "VOID", "VOID", NONE, false, false, false),
			Kind::Relation => row(19, "ANY TABLE", "TABLE", "TABLE", NONE, false, false, false),
			Kind::Model => row(20, "ANY MODEL", "MODEL", "MODEL", NONE, false, false, false),
			Kind::Connection => {
				row(21, "ANY CONNECTION", "CONNECTION", "CONNECTION", NONE, false, false, false)
			}
			Kind::Descriptor => {
				row(22, "ANY DESCRIPTOR", "DESCRIPTOR", "DESCRIPTOR", NONE, false, false, false)
			}
			Kind::Lambda => {
				row(23, "<function<T->T>>", "FUNCTION", "FUNCTION", NONE, false, false, false)
			}
			Kind::Range => row(24, "<range<T>>", "RANGE", "RANGE", T1, true, true, true),
			Kind::GraphNode => {
				row(25, "<graph_node>", "GRAPH_NODE", "GRAPH_NODE", NONE, false, false, true)
			}
			Kind::GraphEdge => {
				row(26, "<graph_edge>", "GRAPH_EDGE", "GRAPH_EDGE", NONE, false, false, true)
			}
			Kind::GraphElement => {
				row(27, "<graph_element>", "GRAPH_ELEMENT", "GRAPH_ELEMENT", NONE, false, false, true)
			}
			Kind::GraphPath => {
				row(28, "<graph_path>", "GRAPH_PATH", "GRAPH_PATH", NONE, false, false, true)
			}
			Kind::Sequence => {
				row(29, "ANY SEQUENCE", "SEQUENCE", "SEQUENCE", NONE, false, false, false)
			}
			Kind::Measure => {
				row(30, "<measure<T1>>", "MEASURE<T1>", "MEASURE", T1, true, false, true)
			}
			Kind::Map => row(
				31,
				"<map<T1, T2>>",
				"MAP<T1, T2>",
				"MAP",
				&[Binding::Slot(Slot::T1), Binding::Slot(Slot::T2)],
				true,
				true,
				true,
			),
		}
	}

	/// The stable numeric code of this kind.
	pub fn code(self) -> u8 {
		self.info().code
	}

	/// Looks a kind up by its stable numeric code.
	pub fn from_code(code: u8) -> Option<Kind> {
		Kind::ALL.get(usize::from(code)).copied()
	}

	/// The debug name of this kind, for example `<T1>` or `ANY TABLE`.
	pub fn name(self) -> &'static str {
		self.info().name
	}

	/// The user-facing name of this kind, with or without template details.
	pub fn user_facing_name(self, print_template_details: bool) -> &'static str {
		let info = self.info();
		if print_template_details {
			info.display
		} else {
			info.display_plain
		}
	}

	pub fn can_have_default_value(self) -> bool {
		self.info().default_allowed
	}

	pub fn is_scalar(self) -> bool {
		self.info().scalar
	}

	pub fn is_container(self) -> bool {
		self.info().container
	}

	pub fn binds(self) -> &'static [Binding] {
		self.info().binds
	}

	/// True for the plain scalar templates `T1` to `T5`.
	pub fn is_any_scalar(self) -> bool {
		matches!(self, Kind::Any(_))
	}

	/// True when `self` is a templated container whose element, key or value
	/// is the template bound by `inner`.
	pub fn is_templated_container_of(self, inner: Kind) -> bool {
		if !self.is_container() || inner.is_container() {
			return false;
		}
		match inner.binds() {
			[binding] => self.binds().contains(binding),
			_ => false,
		}
	}

	/// True when two kinds share a template binding.
	///
	/// Identical kinds are related. A container is related to any kind that binds
	/// one of its template variables, including another container. `Arbitrary`
	/// is related to nothing.
	pub fn is_related(self, other: Kind) -> bool {
		if self == Kind::Arbitrary || other == Kind::Arbitrary {
			return false;
		}
		if self == other {
			return true;
		}
		if !self.is_container() && !other.is_container() {
			return false;
		}
		self.binds().iter().any(|b| other.binds().contains(b))
	}
}

impl fmt::Display for Kind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn codes_are_dense_and_stable() {
		for (i, kind) in Kind::ALL.iter().enumerate() {
			assert_eq!(usize::from(kind.code()), i, "{kind:?}");
			assert_eq!(Kind::from_code(kind.code()), Some(*kind));
		}
		assert_eq!(Kind::from_code(32), None);
	}

	#[rstest]
	#[case::array(Kind::Array(Slot::T1), Kind::Any(Slot::T1), true)]
	#[case::array_other_slot(Kind::Array(Slot::T1), Kind::Any(Slot::T2), false)]
	#[case::map_key(Kind::Map, Kind::Any(Slot::T1), true)]
	#[case::map_value(Kind::Map, Kind::Any(Slot::T2), true)]
	#[case::map_third(Kind::Map, Kind::Any(Slot::T3), false)]
	#[case::range(Kind::Range, Kind::Any(Slot::T1), true)]
	#[case::measure(Kind::Measure, Kind::Any(Slot::T1), true)]
	#[case::proto_map_key(Kind::ProtoMap, Kind::ProtoMapKey, true)]
	#[case::proto_map_value(Kind::ProtoMap, Kind::ProtoMapValue, true)]
	#[case::scalar_outer(Kind::Any(Slot::T1), Kind::Array(Slot::T1), false)]
	#[case::container_inner(Kind::Map, Kind::Array(Slot::T1), false)]
	#[case::arbitrary(Kind::Array(Slot::T1), Kind::Arbitrary, false)]
	fn templated_container_of(#[case] outer: Kind, #[case] inner: Kind, #[case] expected: bool) {
		assert_eq!(outer.is_templated_container_of(inner), expected);
	}

	#[rstest]
	#[case::same(Kind::Any(Slot::T3), Kind::Any(Slot::T3), true)]
	#[case::different_slots(Kind::Any(Slot::T1), Kind::Any(Slot::T2), false)]
	#[case::array_to_scalar(Kind::Any(Slot::T1), Kind::Array(Slot::T1), true)]
	#[case::map_to_array(Kind::Map, Kind::Array(Slot::T2), true)]
	#[case::range_to_array(Kind::Range, Kind::Array(Slot::T1), true)]
	#[case::key_to_value(Kind::ProtoMapKey, Kind::ProtoMapValue, false)]
	#[case::arbitrary(Kind::Arbitrary, Kind::Any(Slot::T1), false)]
	#[case::arbitrary_self(Kind::Arbitrary, Kind::Arbitrary, false)]
	fn related(#[case] a: Kind, #[case] b: Kind, #[case] expected: bool) {
		assert_eq!(a.is_related(b), expected);
		assert_eq!(b.is_related(a), expected);
	}

	#[rstest]
	#[case::fixed(Kind::Fixed, true)]
	#[case::array(Kind::Array(Slot::T4), true)]
	#[case::map(Kind::Map, true)]
	#[case::arbitrary(Kind::Arbitrary, true)]
	#[case::relation(Kind::Relation, false)]
	#[case::void(Kind::Void, false)]
	#[case::descriptor(Kind::Descriptor, false)]
	#[case::graph_path(Kind::GraphPath, false)]
	#[case::measure(Kind::Measure, false)]
	#[case::sequence(Kind::Sequence, false)]
	fn default_values(#[case] kind: Kind, #[case] expected: bool) {
		assert_eq!(kind.can_have_default_value(), expected);
	}

	#[rstest]
	#[case::any(Kind::Any(Slot::T2), "<T2>", "T2", "ANY")]
	#[case::array(Kind::Array(Slot::T1), "<array<T1>>", "ARRAY<T1>", "ARRAY")]
	#[case::map(Kind::Map, "<map<T1, T2>>", "MAP<T1, T2>", "MAP")]
	#[case::relation(Kind::Relation, "ANY TABLE", "TABLE", "TABLE")]
	#[case::lambda(Kind::Lambda, "<function<T->T>>", "FUNCTION", "FUNCTION")]
	fn names(
		#[case] kind: Kind,
		#[case] name: &str,
		#[case] detailed: &str,
		#[case] plain: &str,
	) {
		assert_eq!(kind.to_string(), name);
		assert_eq!(kind.user_facing_name(true), detailed);
		assert_eq!(kind.user_facing_name(false), plain);
	}
}
