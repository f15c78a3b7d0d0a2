use sift_primitives::keys;


/// Escapes the characters that are reserved inside a filter value.
pub fn escape_value(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for ch in value.chars() {
		if matches!(ch, '\\' | '(' | ')' | '*') {
			escaped.push('\\');
		}
		escaped.push(ch);
	}
	escaped
}

/// Filter matching registrations provided under `type_name`.
pub fn type_filter(type_name: &str) -> String {
	format!("({}={})", keys::OBJECT_CLASS, escape_value(type_name))
}

/// Composes one filter from identity names, property clauses and a raw fragment.
///
/// Names are OR-combined equality items on [`keys::COMPONENT_NAME`]. Every property
/// clause (`key=value`) becomes its own parenthesized item, and the raw fragment is
/// appended verbatim. When more than one item contributed, the result is wrapped in an
/// AND. Returns `None` when nothing contributed. Empty names and clauses are skipped.
///
/// The raw fragment and property clauses are not validated here; parse the result to
/// surface syntax errors.
pub fn compose<N, P>(names: &[N], property_clauses: &[P], raw_filter: &str) -> Option<String>
where
	N: AsRef<str>,
	P: AsRef<str>,
{
	let mut items: Vec<String> = Vec::new();

	let names: Vec<&str> = names.iter().map(AsRef::as_ref).filter(|n| !n.is_empty()).collect();
	match names.as_slice() {
		[] => {}
		[name] => items.push(name_item(name)),
		many => {
			let alternatives: String = many.iter().map(|n| name_item(n)).collect();
			items.push(format!("(|{alternatives})"));
		}
	}

	for clause in property_clauses.iter().map(|c| c.as_ref().trim()) {
		if clause.is_empty() {
			continue;
		}
		if clause.starts_with('(') && clause.ends_with(')') {
			items.push(clause.to_string());
		} else {
			items.push(format!("({clause})"));
		}
	}

	let raw_filter = raw_filter.trim();
	if !raw_filter.is_empty() {
		items.push(raw_filter.to_string());
	}

	match items.len() {
		0 => None,
		1 => items.pop(),
		_ => Some(format!("(&{})", items.concat())),
	}
}

fn name_item(name: &str) -> String {
	format!("({}={})", keys::COMPONENT_NAME, escape_value(name))
}
