use serde::{Deserialize, Serialize};

use crate::{
    input::NumberInput,
    nutrition::{
        recommendation::{ActivityLevel, Goal, Recommendation, Sex},
        Profile,
    },
};

/// Body metrics as posted by the profile form and the calculator.
#[derive(Debug, Default, Deserialize)]
pub struct BodyMetricsRequest {
    #[serde(default)]
    pub age: Option<NumberInput>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<NumberInput>,
    #[serde(default)]
    pub height_cm: Option<NumberInput>,
    #[serde(default)]
    pub activity_level: Option<NumberInput>,
    #[serde(default)]
    pub goal: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub goal: Option<Goal>,
}

impl From<&Profile> for ProfileView {
    fn from(p: &Profile) -> Self {
        Self {
            age: p.age,
            sex: p.sex,
            weight_kg: p.weight_kg,
            height_cm: p.height_cm,
            activity_level: p.activity,
            goal: p.goal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileView,
    /// Absent until every field is filled in.
    pub recommendation: Option<Recommendation>,
}

impl From<&Profile> for ProfileResponse {
    fn from(p: &Profile) -> Self {
        Self {
            profile: p.into(),
            recommendation: p.recommendation(),
        }
    }
}

/// Stored values to pre-fill the calculator, plus the accepted choices.
#[derive(Debug, Serialize)]
pub struct CalculatorForm {
    pub initial: ProfileView,
    pub activity_levels: [ActivityLevel; 5],
    pub goals: [Goal; 3],
}
