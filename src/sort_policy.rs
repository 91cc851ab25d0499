// ↕️ Sort Policy - Shared comparators for rankings and presentation
//
// Every comparator is a total order, so sorting with them (stable sort)
// gives the same sequence on every run for the same input.

use crate::record::{Division, WeightClass};
use std::cmp::Ordering;

/// Fixed precedence: SubJunior < Junior < Open < MasterI..IV < Guest
pub fn compare_division(a: Division, b: Division) -> Ordering {
    a.precedence().cmp(&b.precedence())
}

/// Numeric classes ascending, then superheavy, then unclassified
pub fn compare_weight_class(a: &WeightClass, b: &WeightClass) -> Ordering {
    a.cmp_class(b)
}

/// Higher score first; NaN sorts after every number
pub fn compare_score(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Lower place number first
pub fn compare_place(a: u32, b: u32) -> Ordering {
    a.cmp(&b)
}

/// Anything that can be ordered by division, weight class and score
pub trait Rankable {
    fn division(&self) -> Division;
    fn weight_class(&self) -> &WeightClass;
    fn score(&self) -> f64;
}

/// Full presentation order: division, weight class, score descending.
/// Equal keys compare Equal so a stable sort keeps input order.
pub fn compare_entries<T: Rankable>(a: &T, b: &T) -> Ordering {
    compare_division(a.division(), b.division())
        .then_with(|| compare_weight_class(a.weight_class(), b.weight_class()))
        .then_with(|| compare_score(a.score(), b.score()))
}
