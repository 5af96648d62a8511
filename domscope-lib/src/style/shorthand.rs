//! Shorthand expansion and reconstruction.
//!
//! Expansion runs during the cascade so longhands compare uniformly.
//! Reconstruction runs at display time, folding longhand sets back
//! into a compact shorthand. Both are readability approximations, not
//! exact round-trips (asymmetric per-side border styles, for instance,
//! do not fold back perfectly).

use crate::style::owned_css::StyleProperty;

const MARGIN_SIDES: [&str; 4] = [
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
];
const PADDING_SIDES: [&str; 4] = [
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
];
const RADIUS_CORNERS: [&str; 4] = [
    "border-top-left-radius",
    "border-top-right-radius",
    "border-bottom-right-radius",
    "border-bottom-left-radius",
];
const BORDER_PARTS: [&str; 3] = ["border-width", "border-style", "border-color"];
const BACKGROUND_PARTS: [&str; 2] = ["background-color", "background-image"];

/// Expands one shorthand declaration into its longhands. Returns an
/// empty vector when the property is not a recognized shorthand, in
/// which case the caller keeps the declaration as written.
pub fn expand_declaration(property: &str, value: &str) -> Vec<(String, String)> {
    match property {
        "margin" => expand_sides(&MARGIN_SIDES, value),
        "padding" => expand_sides(&PADDING_SIDES, value),
        "border-radius" => expand_sides(&RADIUS_CORNERS, value),
        "border" => expand_border(value),
        _ => Vec::new(),
    }
}

/// TRBL expansion: 1 value applies to all sides, 2 values split
/// vertical/horizontal, 3 values are top/horizontal/bottom, 4 values
/// map directly. Other counts are left unexpanded.
fn expand_sides(names: &[&str; 4], value: &str) -> Vec<(String, String)> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [top, right, bottom, left] = match parts.as_slice() {
        [all] => [*all; 4],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left] => [*top, *right, *bottom, *left],
        _ => return Vec::new(),
    };
    names
        .iter()
        .zip([top, right, bottom, left])
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect()
}

fn expand_border(value: &str) -> Vec<(String, String)> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 3 {
        return Vec::new();
    }
    BORDER_PARTS
        .iter()
        .zip(parts)
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect()
}

/// Folds longhand property sets back into shorthands for display. A
/// shorthand is only declared when every longhand of its group is
/// present; partial groups pass through unchanged. Reconstructed
/// shorthands are emitted first, then leftovers in input order.
pub fn reconstruct(properties: &[StyleProperty]) -> Vec<StyleProperty> {
    let lookup = |name: &str| {
        properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
    };
    let mut consumed: Vec<&str> = Vec::new();
    let mut output = Vec::new();

    if let Some(value) = fold_group(&lookup, &BACKGROUND_PARTS, first_meaningful) {
        output.push(StyleProperty::new("background", value));
        consumed.extend(BACKGROUND_PARTS);
    }
    if let Some(value) = fold_group(&lookup, &BORDER_PARTS, first_meaningful) {
        output.push(StyleProperty::new("border", value));
        consumed.extend(BORDER_PARTS);
    }
    if let Some(value) = fold_group(&lookup, &PADDING_SIDES, fold_sides) {
        output.push(StyleProperty::new("padding", value));
        consumed.extend(PADDING_SIDES);
    }
    if let Some(value) = fold_group(&lookup, &MARGIN_SIDES, fold_sides) {
        output.push(StyleProperty::new("margin", value));
        consumed.extend(MARGIN_SIDES);
    }
    if let Some(value) = fold_group(&lookup, &RADIUS_CORNERS, fold_sides) {
        output.push(StyleProperty::new("border-radius", value));
        consumed.extend(RADIUS_CORNERS);
    }

    for property in properties {
        if !consumed.contains(&property.name.as_str()) {
            output.push(property.clone());
        }
    }
    output
}

fn fold_group(
    lookup: &impl Fn(&str) -> Option<String>,
    names: &[&str],
    fold: impl Fn(&[String]) -> Option<String>,
) -> Option<String> {
    let values: Vec<String> = names.iter().map(|name| lookup(name)).collect::<Option<_>>()?;
    fold(&values)
}

/// Value folding for four-sided groups: all equal gives one value,
/// top/bottom and left/right pairs give two, anything else all four
/// in top right bottom left order.
fn fold_sides(values: &[String]) -> Option<String> {
    let [top, right, bottom, left] = values else {
        return None;
    };
    if top == right && right == bottom && bottom == left {
        Some(top.clone())
    } else if top == bottom && right == left {
        Some(format!("{} {}", top, right))
    } else {
        Some(format!("{} {} {} {}", top, right, bottom, left))
    }
}

/// Representative folding for background and border: the first value
/// that is not a default/no-op stands in for the whole group.
fn first_meaningful(values: &[String]) -> Option<String> {
    values.iter().find(|v| is_meaningful(v)).cloned()
}

fn is_meaningful(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "none" | "initial" | "normal" | "auto" | "medium" | "transparent"
            | "currentcolor" | "rgba(0, 0, 0, 0)"
    )
}
