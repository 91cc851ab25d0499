// 🧮 Score Resolver - Supplied score first, GL formula as fallback
//
// GL points = total × 100 / (A − B·e^(−C·bodyweight))
// Coefficients: IPF GL 2020, classic lifting, one set per sex × discipline.

use crate::error::EngineError;
use crate::record::{CompetitorRecord, Discipline, Sex};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// COEFFICIENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl GlCoefficients {
    pub fn for_category(sex: Sex, discipline: Discipline) -> GlCoefficients {
        match (sex, discipline) {
            (Sex::Male, Discipline::FullPower) => GlCoefficients {
                a: 1199.72839,
                b: 1025.18162,
                c: 0.00921,
            },
            (Sex::Female, Discipline::FullPower) => GlCoefficients {
                a: 610.32796,
                b: 1045.59282,
                c: 0.03048,
            },
            (Sex::Male, Discipline::BenchOnly) => GlCoefficients {
                a: 320.98041,
                b: 281.40258,
                c: 0.01008,
            },
            (Sex::Female, Discipline::BenchOnly) => GlCoefficients {
                a: 142.40398,
                b: 442.52671,
                c: 0.04724,
            },
        }
    }
}

/// GL points rounded to 2 decimals, or None when the formula is undefined
/// for the inputs (non-positive bodyweight/total, non-positive denominator).
pub fn gl_points(sex: Sex, discipline: Discipline, bodyweight_kg: f64, total_kg: f64) -> Option<f64> {
    if !(bodyweight_kg > 0.0) || !(total_kg > 0.0) {
        return None;
    }

    let k = GlCoefficients::for_category(sex, discipline);
    let denominator = k.a - k.b * (-k.c * bodyweight_kg).exp();
    if !(denominator > 0.0) {
        return None;
    }

    let points = total_kg * 100.0 / denominator;
    if !points.is_finite() {
        return None;
    }
    Some((points * 100.0).round() / 100.0)
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    /// Taken verbatim from the results file
    Supplied,
    /// Computed with the GL formula
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScore {
    pub value: f64,
    pub source: ScoreSource,
}

/// Resolve a record's score.
///
/// A finite supplied score is trusted as is; NaN or infinite is no score at
/// all. Otherwise bodyweight and a positive total are required to compute one.
pub fn resolve_score(record: &CompetitorRecord) -> Result<ResolvedScore, EngineError> {
    let insufficient = |reason: &str| EngineError::InsufficientDataForScore {
        competitor: record.name.clone(),
        reason: reason.to_string(),
    };

    if let Some(value) = record.score {
        if !value.is_finite() {
            return Err(insufficient("supplied score is not a finite number"));
        }
        return Ok(ResolvedScore {
            value,
            source: ScoreSource::Supplied,
        });
    }

    let bodyweight = record
        .bodyweight_kg
        .ok_or_else(|| insufficient("bodyweight missing"))?;

    let total = match record.total_kg {
        Some(total) if total > 0.0 => total,
        _ => return Err(insufficient("total missing or not positive")),
    };

    let value = gl_points(record.sex, record.discipline, bodyweight, total)
        .ok_or_else(|| insufficient("GL formula undefined for bodyweight"))?;

    debug!(competitor = %record.name, value, "score computed with GL formula");

    Ok(ResolvedScore {
        value,
        source: ScoreSource::Computed,
    })
}
