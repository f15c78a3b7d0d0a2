use serde::Deserialize;


/// Requested result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
	/// One service (or absent).
	#[default]
	Scalar,
	/// Every matching service, in ranking order.
	Collection,
}

/// How a scalar request treats more than one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
	/// Take the highest-ranked match.
	#[default]
	HighestRankingAlways,
	/// More than one match is an error.
	HighestRankingOrError,
}

/// Outcome of the selection policy for a given number of surviving candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
	Absent,
	NotFound,
	Ambiguous(usize),
	/// Take the first candidate.
	Head,
	/// Take every candidate.
	All,
}

/// Applies the selection policy to `count` ordered candidates.
pub fn decide(count: usize, shape: Shape, mode: SelectionMode, optional: bool) -> Verdict {
	match (shape, count) {
		(Shape::Collection, _) => Verdict::All,
		(Shape::Scalar, 0) if optional => Verdict::Absent,
		(Shape::Scalar, 0) => Verdict::NotFound,
		(Shape::Scalar, 1) => Verdict::Head,
		(Shape::Scalar, n) => match mode {
			SelectionMode::HighestRankingAlways => Verdict::Head,
			SelectionMode::HighestRankingOrError => Verdict::Ambiguous(n),
		},
	}
}
