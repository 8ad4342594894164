use crate::{
    error::ValidationError,
    input::{read_number, NumberInput},
    nutrition::{
        recommendation::{ActivityLevel, BodyMetrics, Goal, Sex},
        Profile,
    },
};

use super::dto::BodyMetricsRequest;

fn positive(input: Option<&NumberInput>) -> Result<Option<f64>, ValidationError> {
    match read_number(input)? {
        Some(v) if v <= 0.0 => Err(ValidationError::NonPositiveBodyMetrics),
        other => Ok(other),
    }
}

pub const MAX_AGE: u32 = 150;

fn age(input: Option<&NumberInput>) -> Result<Option<u32>, ValidationError> {
    match positive(input)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && v <= f64::from(MAX_AGE) => Ok(Some(v as u32)),
        Some(_) => Err(ValidationError::AgeOutOfRange),
    }
}

fn activity(input: Option<&NumberInput>) -> Result<Option<ActivityLevel>, ValidationError> {
    match input {
        None => Ok(None),
        Some(NumberInput::Number(n)) => ActivityLevel::try_from(*n).map(Some),
        Some(NumberInput::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberInput::Text(s)) => s.parse().map(Some),
    }
}

fn category<T>(raw: Option<&str>) -> Result<Option<T>, ValidationError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

/// Replaces every profile field with the posted value; omitted fields are cleared.
pub fn apply_update(profile: &Profile, body: &BodyMetricsRequest) -> Result<Profile, ValidationError> {
    Ok(Profile {
        user_id: profile.user_id,
        age: age(body.age.as_ref())?,
        sex: category::<Sex>(body.sex.as_deref())?,
        weight_kg: positive(body.weight_kg.as_ref())?,
        height_cm: positive(body.height_cm.as_ref())?,
        activity: activity(body.activity_level.as_ref())?,
        goal: category::<Goal>(body.goal.as_deref())?,
    })
}

/// All six metrics are required for a one-off calculation.
pub fn calculator_metrics(body: &BodyMetricsRequest) -> Result<BodyMetrics, ValidationError> {
    let metrics = BodyMetrics {
        age: age(body.age.as_ref())?.ok_or(ValidationError::NonPositiveBodyMetrics)?,
        sex: category::<Sex>(body.sex.as_deref())?.ok_or(ValidationError::UnrecognizedSex)?,
        weight_kg: positive(body.weight_kg.as_ref())?
            .ok_or(ValidationError::NonPositiveBodyMetrics)?,
        height_cm: positive(body.height_cm.as_ref())?
            .ok_or(ValidationError::NonPositiveBodyMetrics)?,
        activity: activity(body.activity_level.as_ref())?
            .ok_or(ValidationError::UnrecognizedActivityLevel)?,
        goal: category::<Goal>(body.goal.as_deref())?.ok_or(ValidationError::UnrecognizedGoal)?,
    };
    metrics.validate()
}
