//! Display-rank specificity heuristic.
//!
//! This weight orders rule groups for presentation only; the real
//! cascade uses the structured tuple in
//! [`crate::style::css_matcher::compute_specificity`]. The heuristic
//! is deliberately approximate: ids weigh 100, class/attribute/pseudo
//! markers weigh 10, and each run of alphabetic characters counts 1 as
//! a proxy for type selectors. Malformed selectors simply score low,
//! never error.

/// Weight assigned to the synthetic inline-style group, above anything
/// a selector can reasonably score.
pub const INLINE_SPECIFICITY: u32 = 1000;

/// Computes the display-ranking weight of a selector string.
pub fn compute_specificity(selector: &str) -> u32 {
    let ids = selector.matches('#').count() as u32;
    let classes = selector
        .chars()
        .filter(|&c| c == '.' || c == '[' || c == ':')
        .count() as u32;
    ids * 100 + classes * 10 + letter_runs(selector)
}

/// Counts maximal runs of alphabetic characters. `div.card` has two
/// runs; the class run is intentionally counted too, overcounting on
/// long selectors is an accepted trade-off.
fn letter_runs(selector: &str) -> u32 {
    let mut runs = 0;
    let mut in_run = false;
    for ch in selector.chars() {
        if ch.is_alphabetic() {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_outranks_class_outranks_tag() {
        assert!(compute_specificity("#id") > compute_specificity(".class"));
        assert!(compute_specificity(".class") > compute_specificity("div"));
    }

    #[test]
    fn weights_accumulate_per_component() {
        assert_eq!(compute_specificity("div"), 1);
        assert_eq!(compute_specificity(".card"), 11);
        assert_eq!(compute_specificity("#main"), 101);
        // tag run + class marker + class run
        assert_eq!(compute_specificity("div.card"), 12);
    }

    #[test]
    fn malformed_selectors_score_low() {
        assert_eq!(compute_specificity(""), 0);
        assert_eq!(compute_specificity("123"), 0);
    }

    #[test]
    fn inline_weight_beats_heavy_selectors() {
        assert!(INLINE_SPECIFICITY > compute_specificity("#a #b #c.d.e:hover"));
    }
}
