//! Derivation of absolute nutrient values from a baseline and an amount, and
//! re-derivation when the amount of a logged entry is edited.

use super::entry::{FreeformEntry, LoggedEntry, PartialNutrients};
use super::nutrients::{round_to, Nutrients};
use crate::error::ValidationError;

/// Places kept for every stored freeform value.
pub const STORED_PLACES: i32 = 3;

pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidAmount);
    }
    if amount <= 0.0 {
        return Err(ValidationError::AmountNotPositive);
    }
    Ok(amount)
}

/// Values and baseline of a freeform entry ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFreeform {
    pub amount: f64,
    pub values: Nutrients,
    pub per100: PartialNutrients,
    pub rates: Nutrients,
}

/// Resolves each nutrient of a new freeform entry: an explicit non-zero value
/// wins, then a positive per-100 baseline scaled to `amount`, else 0.
///
/// When energy has neither a value nor a baseline but macro baselines are
/// present, an energy baseline is derived from them and stored with the entry.
pub fn resolve_freeform(
    amount: f64,
    direct: PartialNutrients,
    per100: PartialNutrients,
) -> Result<ResolvedFreeform, ValidationError> {
    let amount = validate_amount(amount)?;

    let supplied = [
        direct.kcal,
        direct.protein,
        direct.fat,
        direct.carbs,
        per100.kcal,
        per100.protein,
        per100.fat,
        per100.carbs,
    ];
    if supplied.iter().flatten().any(|v| v.is_nan() || *v < 0.0) {
        return Err(ValidationError::NegativeNutrient);
    }

    let mut per100 = per100;
    let energy_given = is_nonzero(direct.kcal) || is_positive(per100.kcal);
    let macro_baseline = Nutrients::new(
        0.0,
        per100.protein.unwrap_or(0.0),
        per100.fat.unwrap_or(0.0),
        per100.carbs.unwrap_or(0.0),
    );
    if !energy_given && macro_baseline.energy_from_macros() > 0.0 {
        per100.kcal = Some(macro_baseline.energy_from_macros());
    }

    let pick = |value: Option<f64>, base: Option<f64>| -> f64 {
        match (value, base) {
            (Some(v), _) if v != 0.0 => v,
            (_, Some(b)) if b > 0.0 => b * amount / 100.0,
            _ => 0.0,
        }
    };
    let values = Nutrients::new(
        pick(direct.kcal, per100.kcal),
        pick(direct.protein, per100.protein),
        pick(direct.fat, per100.fat),
        pick(direct.carbs, per100.carbs),
    );
    let rates = per_unit_rates(amount, values, per100);

    let round = |v: Option<f64>| v.map(|v| round_to(v, STORED_PLACES));
    Ok(ResolvedFreeform {
        amount,
        values: values.rounded(STORED_PLACES),
        per100: PartialNutrients {
            kcal: round(per100.kcal),
            protein: round(per100.protein),
            fat: round(per100.fat),
            carbs: round(per100.carbs),
        },
        rates,
    })
}

/// Per-unit rates for a new entry, taken before any rounding. A positive
/// baseline is authoritative; otherwise the rate is value / amount.
pub fn per_unit_rates(amount: f64, values: Nutrients, per100: PartialNutrients) -> Nutrients {
    let rate = |base: Option<f64>, value: f64| -> f64 {
        match base {
            Some(b) if b > 0.0 => b / 100.0,
            _ if amount > 0.0 && value != 0.0 => value / amount,
            _ => 0.0,
        }
    };
    Nutrients::new(
        rate(per100.kcal, values.kcal),
        rate(per100.protein, values.protein),
        rate(per100.fat, values.fat),
        rate(per100.carbs, values.carbs),
    )
}

/// Scales the rates fixed at creation. Neither the rates nor the per-100
/// baseline are touched, so repeated edits do not drift.
pub fn recompute_freeform(entry: &FreeformEntry, new_amount: f64) -> FreeformEntry {
    FreeformEntry {
        amount: new_amount,
        values: entry.rates.scale(new_amount).rounded(STORED_PLACES),
        ..entry.clone()
    }
}

/// Applies an already validated amount to either kind of entry. Catalog-linked
/// entries only change their amount; their values are derived on read.
pub fn apply_amount(entry: LoggedEntry, new_amount: f64) -> LoggedEntry {
    match entry {
        LoggedEntry::Catalog(mut e) => {
            e.amount = new_amount;
            LoggedEntry::Catalog(e)
        }
        LoggedEntry::Freeform(e) => LoggedEntry::Freeform(recompute_freeform(&e, new_amount)),
    }
}

fn is_nonzero(v: Option<f64>) -> bool {
    v.is_some_and(|v| v != 0.0)
}

fn is_positive(v: Option<f64>) -> bool {
    v.is_some_and(|v| v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::entry::fixtures::{catalog_entry, freeform_entry};
    use crate::nutrition::nutrients::NutrientSource;
    use uuid::Uuid;

    fn partial(kcal: f64, protein: f64, fat: f64, carbs: f64) -> PartialNutrients {
        PartialNutrients {
            kcal: Some(kcal),
            protein: Some(protein),
            fat: Some(fat),
            carbs: Some(carbs),
        }
    }

    #[test]
    fn amount_must_be_positive_and_finite() {
        assert_eq!(validate_amount(0.0), Err(ValidationError::AmountNotPositive));
        assert_eq!(validate_amount(-3.0), Err(ValidationError::AmountNotPositive));
        assert_eq!(validate_amount(f64::NAN), Err(ValidationError::InvalidAmount));
        assert_eq!(validate_amount(12.5), Ok(12.5));
    }

    #[test]
    fn explicit_values_win_over_baseline() {
        let r = resolve_freeform(120.0, partial(240.0, 6.0, 3.6, 24.0), partial(50.0, 1.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(r.values, Nutrients::new(240.0, 6.0, 3.6, 24.0));
    }

    #[test]
    fn baseline_scales_to_amount() {
        let r = resolve_freeform(150.0, PartialNutrients::default(), partial(200.0, 10.0, 4.0, 30.0))
            .unwrap();
        assert_eq!(r.values, Nutrients::new(300.0, 15.0, 6.0, 45.0));
        assert_eq!(r.per100.kcal, Some(200.0));
    }

    #[test]
    fn zero_explicit_value_falls_back_to_baseline() {
        let direct = PartialNutrients {
            kcal: Some(0.0),
            ..Default::default()
        };
        let per100 = PartialNutrients {
            kcal: Some(80.0),
            ..Default::default()
        };
        let r = resolve_freeform(50.0, direct, per100).unwrap();
        assert_eq!(r.values.kcal, 40.0);
    }

    #[test]
    fn energy_baseline_is_derived_from_macro_baselines() {
        let per100 = PartialNutrients {
            kcal: None,
            protein: Some(10.0),
            fat: Some(5.0),
            carbs: Some(20.0),
        };
        let r = resolve_freeform(200.0, PartialNutrients::default(), per100).unwrap();
        assert_eq!(r.per100.kcal, Some(165.0));
        assert_eq!(r.values.kcal, 330.0);
        assert_eq!(r.values.protein, 20.0);
    }

    #[test]
    fn nothing_supplied_means_zero() {
        let r = resolve_freeform(100.0, PartialNutrients::default(), PartialNutrients::default())
            .unwrap();
        assert_eq!(r.values, Nutrients::ZERO);
        assert_eq!(r.per100, PartialNutrients::default());
    }

    #[test]
    fn any_negative_value_rejects_creation() {
        let direct = PartialNutrients {
            fat: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(
            resolve_freeform(100.0, direct, PartialNutrients::default()),
            Err(ValidationError::NegativeNutrient)
        );
        let per100 = PartialNutrients {
            carbs: Some(-0.5),
            ..Default::default()
        };
        assert_eq!(
            resolve_freeform(100.0, PartialNutrients::default(), per100),
            Err(ValidationError::NegativeNutrient)
        );
    }

    #[test]
    fn stored_values_are_rounded_to_three_places() {
        let per100 = PartialNutrients {
            kcal: Some(33.3333),
            ..Default::default()
        };
        let r = resolve_freeform(10.0, PartialNutrients::default(), per100).unwrap();
        assert_eq!(r.values.kcal, 3.333);
        assert_eq!(r.per100.kcal, Some(33.333));
    }

    fn stored(r: ResolvedFreeform) -> FreeformEntry {
        FreeformEntry {
            amount: r.amount,
            values: r.values,
            per100: r.per100,
            rates: r.rates,
            ..freeform_entry(Uuid::new_v4(), r.amount, Nutrients::ZERO)
        }
    }

    #[test]
    fn edit_with_baseline_ignores_previous_values() {
        let e = stored(
            resolve_freeform(100.0, partial(999.0, 1.0, 1.0, 1.0), partial(200.0, 10.0, 0.0, 0.0))
                .unwrap(),
        );
        assert_eq!(e.values.kcal, 999.0);

        let edited = recompute_freeform(&e, 50.0);
        assert_eq!(edited.values.kcal, 100.0);
        assert_eq!(edited.values.protein, 5.0);
        // fat has no positive baseline: keeps its own rate of 1.0 / 100
        assert_eq!(edited.values.fat, 0.5);
        assert_eq!(edited.per100, e.per100);
    }

    #[test]
    fn rate_without_baseline_is_fixed_at_creation() {
        let direct = PartialNutrients {
            kcal: Some(1.0),
            protein: Some(0.7),
            ..Default::default()
        };
        let e = stored(resolve_freeform(3.0, direct, PartialNutrients::default()).unwrap());

        let down = recompute_freeform(&e, 1.0);
        assert_eq!(down.values.kcal, 0.333);
        assert_eq!(down.rates, e.rates);

        let back = recompute_freeform(&down, 3.0);
        assert_eq!(back.values.kcal, 1.0);
        assert_eq!(back.values.protein, 0.7);

        let mut wandering = e.clone();
        for amount in [7.0, 0.1, 13.0, 2.0, 3.0] {
            wandering = recompute_freeform(&wandering, amount);
        }
        assert_eq!(wandering.values, e.values);
    }

    #[test]
    fn edit_without_baseline_keeps_original_rate() {
        let e = freeform_entry(Uuid::new_v4(), 100.0, Nutrients::new(200.0, 10.0, 5.0, 20.0));
        let edited = recompute_freeform(&e, 50.0);
        assert_eq!(edited.amount, 50.0);
        assert_eq!(edited.values, Nutrients::new(100.0, 5.0, 2.5, 10.0));

        let back = recompute_freeform(&edited, 100.0);
        assert_eq!(back.values, e.values);
    }

    #[test]
    fn zero_values_stay_zero() {
        let e = freeform_entry(Uuid::new_v4(), 100.0, Nutrients::ZERO);
        assert_eq!(recompute_freeform(&e, 300.0).values, Nutrients::ZERO);
    }

    #[test]
    fn catalog_edit_only_moves_amount() {
        let e = catalog_entry(None, Nutrients::new(200.0, 5.0, 3.0, 20.0), 100.0);
        let edited = apply_amount(LoggedEntry::Catalog(e.clone()), 250.0);
        match &edited {
            LoggedEntry::Catalog(c) => {
                assert_eq!(c.amount, 250.0);
                assert_eq!(c.initial_amount, 100.0);
            }
            LoggedEntry::Freeform(_) => panic!("kind changed"),
        }
        assert_eq!(edited.nutrients(), Nutrients::new(500.0, 12.5, 7.5, 50.0));
    }
}
