//! Per-subject demographic data.

use serde::{Deserialize, Serialize};

use crate::enums::Gender;

/// Demographics of the subject a record belongs to.
///
/// Every field is independently optional: `None` means the value was not
/// recorded for this subject or dataset, which is never the same as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectData {
    pub gender: Option<Gender>,
    /// Age in years.
    pub age: Option<u32>,
    /// Weight in kg.
    pub weight: Option<f64>,
}

impl SubjectData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gender(mut self, gender: Option<Gender>) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_age(mut self, age: Option<u32>) -> Self {
        self.age = age;
        self
    }

    pub fn with_weight(mut self, weight: Option<f64>) -> Self {
        self.weight = weight;
        self
    }

    /// Returns true if no field was recorded.
    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && self.age.is_none() && self.weight.is_none()
    }
}
