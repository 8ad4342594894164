//! Daily energy and macro targets from body metrics.
//!
//! BMR uses the Mifflin-St Jeor equation (Mifflin et al., 1990):
//! `10 * weight_kg + 6.25 * height_cm - 5 * age + s`, with `s = +5` for men and
//! `s = -161` otherwise. TDEE is BMR times the activity multiplier, and the goal
//! shifts it by a fixed 500 kcal.

use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::nutrients::round_to;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other => "O",
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Sex::Male),
            "f" | "female" => Ok(Sex::Female),
            "o" | "other" => Ok(Sex::Other),
            _ => Err(ValidationError::UnrecognizedSex),
        }
    }
}

impl Serialize for Sex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// The five supported activity multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    High,
    VeryHigh,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::High,
        ActivityLevel::VeryHigh,
    ];

    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::High => 1.725,
            ActivityLevel::VeryHigh => 1.9,
        }
    }

    /// Text form used for storage, e.g. `"1.55"`.
    pub fn code(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "1.2",
            ActivityLevel::Light => "1.375",
            ActivityLevel::Moderate => "1.55",
            ActivityLevel::High => "1.725",
            ActivityLevel::VeryHigh => "1.9",
        }
    }
}

impl TryFrom<f64> for ActivityLevel {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        ActivityLevel::ALL
            .into_iter()
            .find(|level| (level.multiplier() - value).abs() < 1e-9)
            .ok_or(ValidationError::UnrecognizedActivityLevel)
    }
}

impl FromStr for ActivityLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::UnrecognizedActivityLevel)?;
        ActivityLevel::try_from(value)
    }
}

impl Serialize for ActivityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.multiplier())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    pub fn code(&self) -> &'static str {
        match self {
            Goal::Lose => "lose",
            Goal::Maintain => "maintain",
            Goal::Gain => "gain",
        }
    }

    /// Daily energy adjustment in kcal.
    pub fn adjustment(&self) -> f64 {
        match self {
            Goal::Lose => -500.0,
            Goal::Maintain => 0.0,
            Goal::Gain => 500.0,
        }
    }
}

impl FromStr for Goal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lose" => Ok(Goal::Lose),
            "maintain" => Ok(Goal::Maintain),
            "gain" => Ok(Goal::Gain),
            _ => Err(ValidationError::UnrecognizedGoal),
        }
    }
}

/// A complete set of body metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    pub age: u32,
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity: ActivityLevel,
    pub goal: Goal,
}

impl BodyMetrics {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if self.age == 0 || !positive(self.weight_kg) || !positive(self.height_cm) {
            return Err(ValidationError::NonPositiveBodyMetrics);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub bmr: f64,
    pub tdee: f64,
    pub recommended_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

const PROTEIN_G_PER_KG: f64 = 1.6;
const FAT_ENERGY_SHARE: f64 = 0.25;
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;
const KCAL_PER_G_CARBS: f64 = 4.0;

pub fn mifflin_st_jeor(m: &BodyMetrics) -> f64 {
    let base = 10.0 * m.weight_kg + 6.25 * m.height_cm - 5.0 * f64::from(m.age);
    match m.sex {
        Sex::Male => base + 5.0,
        Sex::Female | Sex::Other => base - 161.0,
    }
}

/// Does not guard against non-positive metrics; callers run
/// [`BodyMetrics::validate`] first. Garbage in gives garbage out.
pub fn recommend(m: &BodyMetrics) -> Recommendation {
    let bmr = mifflin_st_jeor(m);
    let tdee = bmr * m.activity.multiplier();
    let recommended = tdee + m.goal.adjustment();

    let protein_g = round_to(PROTEIN_G_PER_KG * m.weight_kg, 1);
    let protein_kcal = protein_g * KCAL_PER_G_PROTEIN;
    let fat_kcal = FAT_ENERGY_SHARE * recommended;
    let fat_g = round_to(fat_kcal / KCAL_PER_G_FAT, 1);
    let carbs_kcal = (recommended - protein_kcal - fat_kcal).max(0.0);
    let carbs_g = round_to(carbs_kcal / KCAL_PER_G_CARBS, 1);

    Recommendation {
        bmr: round_to(bmr, 1),
        tdee: round_to(tdee, 1),
        recommended_kcal: round_to(recommended, 1),
        protein_g,
        fat_g,
        carbs_g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_male() -> BodyMetrics {
        BodyMetrics {
            age: 30,
            sex: Sex::Male,
            weight_kg: 80.0,
            height_cm: 180.0,
            activity: ActivityLevel::Moderate,
            goal: Goal::Maintain,
        }
    }

    #[test]
    fn reference_male_maintain() {
        let r = recommend(&reference_male());
        // 800 + 1125 - 150 + 5
        assert_eq!(r.bmr, 1780.0);
        assert_eq!(r.tdee, 2759.0);
        assert_eq!(r.recommended_kcal, 2759.0);
        assert_eq!(r.protein_g, 128.0);
        // 0.25 * 2759 / 9
        assert_eq!(r.fat_g, 76.6);
        // (2759 - 512 - 689.75) / 4
        assert_eq!(r.carbs_g, 389.3);
    }

    #[test]
    fn female_and_other_share_the_variant() {
        let female = BodyMetrics {
            sex: Sex::Female,
            ..reference_male()
        };
        let other = BodyMetrics {
            sex: Sex::Other,
            ..reference_male()
        };
        assert_eq!(mifflin_st_jeor(&female), 1614.0);
        assert_eq!(mifflin_st_jeor(&female), mifflin_st_jeor(&other));
    }

    #[test]
    fn goal_shifts_energy_by_500() {
        let lose = recommend(&BodyMetrics {
            goal: Goal::Lose,
            ..reference_male()
        });
        let gain = recommend(&BodyMetrics {
            goal: Goal::Gain,
            ..reference_male()
        });
        assert_eq!(lose.recommended_kcal, 2259.0);
        assert_eq!(gain.recommended_kcal, 3259.0);
        assert_eq!(lose.protein_g, gain.protein_g);
    }

    #[test]
    fn carbs_never_go_negative() {
        let r = recommend(&BodyMetrics {
            age: 100,
            sex: Sex::Female,
            weight_kg: 40.0,
            height_cm: 50.0,
            activity: ActivityLevel::Sedentary,
            goal: Goal::Lose,
        });
        assert_eq!(r.carbs_g, 0.0);
    }

    #[test]
    fn parses_categories() {
        assert_eq!("M".parse::<Sex>(), Ok(Sex::Male));
        assert_eq!("female".parse::<Sex>(), Ok(Sex::Female));
        assert_eq!("x".parse::<Sex>(), Err(ValidationError::UnrecognizedSex));

        assert_eq!("1.55".parse::<ActivityLevel>(), Ok(ActivityLevel::Moderate));
        assert_eq!(ActivityLevel::try_from(1.9), Ok(ActivityLevel::VeryHigh));
        assert_eq!(
            "1.6".parse::<ActivityLevel>(),
            Err(ValidationError::UnrecognizedActivityLevel)
        );

        assert_eq!("Gain".parse::<Goal>(), Ok(Goal::Gain));
        assert_eq!("bulk".parse::<Goal>(), Err(ValidationError::UnrecognizedGoal));
    }

    #[test]
    fn validate_rejects_non_positive_metrics() {
        assert!(reference_male().validate().is_ok());
        let zero_age = BodyMetrics {
            age: 0,
            ..reference_male()
        };
        assert_eq!(
            zero_age.validate(),
            Err(ValidationError::NonPositiveBodyMetrics)
        );
        let negative_weight = BodyMetrics {
            weight_kg: -70.0,
            ..reference_male()
        };
        assert_eq!(
            negative_weight.validate(),
            Err(ValidationError::NonPositiveBodyMetrics)
        );
    }

    #[test]
    fn activity_serializes_as_multiplier() {
        let json = serde_json::to_string(&ActivityLevel::High).unwrap();
        assert_eq!(json, "1.725");
        assert_eq!(serde_json::to_string(&Goal::Lose).unwrap(), "\"lose\"");
    }
}
