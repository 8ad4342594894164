use uuid::Uuid;

use super::recommendation::{recommend, ActivityLevel, BodyMetrics, Goal, Recommendation, Sex};

/// Per-user body profile. Every field is optional; a recommendation exists
/// only once all of them are filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: Uuid,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity: Option<ActivityLevel>,
    pub goal: Option<Goal>,
}

impl Profile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            age: None,
            sex: None,
            weight_kg: None,
            height_cm: None,
            activity: None,
            goal: None,
        }
    }

    pub fn metrics(&self) -> Option<BodyMetrics> {
        Some(BodyMetrics {
            age: self.age?,
            sex: self.sex?,
            weight_kg: self.weight_kg?,
            height_cm: self.height_cm?,
            activity: self.activity?,
            goal: self.goal?,
        })
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        self.metrics()
            .and_then(|m| m.validate().ok())
            .map(|m| recommend(&m))
    }
}
