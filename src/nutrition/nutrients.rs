use serde::{Deserialize, Serialize};

/// Energy (kcal) and the three macros (g). Used both for absolute values of an
/// entry and for per-100-unit baselines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub kcal: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Nutrients {
    pub const ZERO: Nutrients = Nutrients {
        kcal: 0.0,
        protein: 0.0,
        fat: 0.0,
        carbs: 0.0,
    };

    pub fn new(kcal: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            kcal,
            protein,
            fat,
            carbs,
        }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            kcal: f(self.kcal),
            protein: f(self.protein),
            fat: f(self.fat),
            carbs: f(self.carbs),
        }
    }

    pub fn scale(self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    pub fn rounded(self, places: i32) -> Self {
        self.map(|v| round_to(v, places))
    }

    /// Energy per 100 units from the macros (4/9/4 kcal per gram).
    pub fn energy_from_macros(&self) -> f64 {
        self.protein * 4.0 + self.fat * 9.0 + self.carbs * 4.0
    }

    /// A baseline whose energy is missing gets it derived from the macros.
    pub fn with_derived_energy(self) -> Self {
        let has_macros = self.protein > 0.0 || self.fat > 0.0 || self.carbs > 0.0;
        if self.kcal <= 0.0 && has_macros {
            Self {
                kcal: self.energy_from_macros(),
                ..self
            }
        } else {
            self
        }
    }

    /// Absolute values for `amount` units of a per-100 baseline.
    pub fn for_amount(self, amount: f64) -> Self {
        self.map(|per100| amount * per100 / 100.0)
    }

    pub fn any_negative(&self) -> bool {
        [self.kcal, self.protein, self.fat, self.carbs]
            .iter()
            .any(|v| *v < 0.0)
    }
}

impl std::ops::Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            kcal: self.kcal + rhs.kcal,
            protein: self.protein + rhs.protein,
            fat: self.fat + rhs.fat,
            carbs: self.carbs + rhs.carbs,
        }
    }
}

impl std::ops::AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Self {
        iter.fold(Nutrients::ZERO, |acc, n| acc + n)
    }
}

/// Anything that can report its absolute nutrient values.
pub trait NutrientSource {
    fn nutrients(&self) -> Nutrients;
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
