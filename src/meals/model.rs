use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Fixed meal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] =
        [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }

    /// Unknown tags fall back to `Snack`, matching what stored records from
    /// older versions decode to.
    pub fn parse(raw: &str) -> MealType {
        match raw {
            "Breakfast" => MealType::Breakfast,
            "Lunch" => MealType::Lunch,
            "Dinner" => MealType::Dinner,
            _ => MealType::Snack,
        }
    }
}

/// Structured output of the vision analysis endpoint. Field names mirror the
/// JSON shape the model is instructed to return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEstimate {
    pub meal_name: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub key_nutrients: String,
}

/// One tracked meal. Constructed after analysis, optionally edited, then
/// handed to the orchestrator exactly once; after that the only mutation is
/// attaching `remote_doc_id` on a successful remote create.
#[derive(Debug, Clone)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub date: OffsetDateTime,
    pub meal_type: MealType,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub key_nutrients: String,
    pub notes: String,
    pub photos: Vec<Bytes>,
    /// Identifier of the mirrored remote document. Set if and only if the
    /// record was successfully created on the remote service.
    pub remote_doc_id: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Meal {
    pub fn new(name: impl Into<String>, meal_type: MealType) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date: now,
            meal_type,
            calories: 0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            key_nutrients: String::new(),
            notes: String::new(),
            photos: Vec::new(),
            remote_doc_id: None,
            created_at: now,
        }
    }

    /// Build a meal from an analysis result; the caller may edit fields
    /// before saving.
    pub fn from_estimate(estimate: &NutritionEstimate, meal_type: MealType) -> Self {
        let mut meal = Meal::new(estimate.meal_name.clone(), meal_type);
        meal.calories = estimate.calories;
        meal.protein = estimate.protein;
        meal.carbs = estimate.carbs;
        meal.fat = estimate.fat;
        meal.key_nutrients = estimate.key_nutrients.clone();
        meal
    }

    /// Total macros in grams.
    pub fn total_macros(&self) -> f64 {
        self.protein + self.carbs + self.fat
    }

    /// Macro shares as percentages of total grams; all zeros when no macros
    /// are recorded.
    pub fn macro_percentages(&self) -> (f64, f64, f64) {
        let total = self.total_macros();
        if total <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        (
            self.protein / total * 100.0,
            self.carbs / total * 100.0,
            self.fat / total * 100.0,
        )
    }
}
