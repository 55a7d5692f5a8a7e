//! Aggregations over the local store for the daily/trends screens. All
//! dates are UTC calendar days; callers pass `OffsetDateTime::now_utc().date()`
//! for "today".

use time::{Date, Duration};

use crate::meals::store::MealStore;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyTotals {
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacroAverages {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Sum of all meals logged on one day.
pub async fn daily_totals(store: &dyn MealStore, day: Date) -> anyhow::Result<DailyTotals> {
    let meals = store.fetch_for_day(day).await?;
    let mut totals = DailyTotals::default();
    for meal in &meals {
        totals.calories += meal.calories;
        totals.protein += meal.protein;
        totals.carbs += meal.carbs;
        totals.fat += meal.fat;
    }
    Ok(totals)
}

/// Per-day averages over the seven days before `ending` (exclusive). Days
/// without meals count toward the divisor; all zeros when nothing was logged.
pub async fn weekly_averages(
    store: &dyn MealStore,
    ending: Date,
) -> anyhow::Result<MacroAverages> {
    let end = ending.midnight().assume_utc();
    let start = end - Duration::days(7);
    let meals = store.fetch_range(start, end).await?;
    if meals.is_empty() {
        return Ok(MacroAverages::default());
    }

    let mut totals = DailyTotals::default();
    for meal in &meals {
        totals.calories += meal.calories;
        totals.protein += meal.protein;
        totals.carbs += meal.carbs;
        totals.fat += meal.fat;
    }

    let days = 7.0;
    Ok(MacroAverages {
        calories: f64::from(totals.calories) / days,
        protein: totals.protein / days,
        carbs: totals.carbs / days,
        fat: totals.fat / days,
    })
}

/// Calorie totals for the last `days` days up to and including `ending`,
/// oldest day first.
pub async fn daily_calories(
    store: &dyn MealStore,
    days: u32,
    ending: Date,
) -> anyhow::Result<Vec<(Date, u32)>> {
    let mut results = Vec::with_capacity(days as usize);
    for offset in (0..i64::from(days)).rev() {
        let day = ending - Duration::days(offset);
        let totals = daily_totals(store, day).await?;
        results.push((day, totals.calories));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::meals::model::{Meal, MealType};
    use crate::meals::store::testing::InMemoryStore;

    fn meal(calories: u32, protein: f64, date: time::OffsetDateTime) -> Meal {
        let mut m = Meal::new("m", MealType::Lunch);
        m.calories = calories;
        m.protein = protein;
        m.carbs = 10.0;
        m.fat = 5.0;
        m.date = date;
        m
    }

    #[tokio::test]
    async fn daily_totals_sums_one_day_only() {
        let store = InMemoryStore::default();
        store.insert(&meal(400, 30.0, datetime!(2024-03-02 08:00 UTC))).await.unwrap();
        store.insert(&meal(600, 40.0, datetime!(2024-03-02 19:00 UTC))).await.unwrap();
        store.insert(&meal(999, 99.0, datetime!(2024-03-03 08:00 UTC))).await.unwrap();

        let totals = daily_totals(&store, date!(2024 - 03 - 02)).await.unwrap();
        assert_eq!(totals.calories, 1000);
        assert!((totals.protein - 70.0).abs() < 1e-9);
        assert!((totals.carbs - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn weekly_averages_divide_by_seven_days() {
        let store = InMemoryStore::default();
        // two meals inside the window, one on the excluded end day
        store.insert(&meal(700, 70.0, datetime!(2024-03-05 12:00 UTC))).await.unwrap();
        store.insert(&meal(700, 70.0, datetime!(2024-03-09 12:00 UTC))).await.unwrap();
        store.insert(&meal(500, 10.0, datetime!(2024-03-10 08:00 UTC))).await.unwrap();

        let avg = weekly_averages(&store, date!(2024 - 03 - 10)).await.unwrap();
        assert!((avg.calories - 200.0).abs() < 1e-9);
        assert!((avg.protein - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn weekly_averages_of_empty_store_are_zero() {
        let store = InMemoryStore::default();
        let avg = weekly_averages(&store, date!(2024 - 03 - 10)).await.unwrap();
        assert_eq!(avg, MacroAverages::default());
    }

    #[tokio::test]
    async fn daily_calories_runs_oldest_first_and_includes_empty_days() {
        let store = InMemoryStore::default();
        store.insert(&meal(300, 10.0, datetime!(2024-03-01 12:00 UTC))).await.unwrap();
        store.insert(&meal(450, 10.0, datetime!(2024-03-03 12:00 UTC))).await.unwrap();

        let series = daily_calories(&store, 3, date!(2024 - 03 - 03)).await.unwrap();
        assert_eq!(
            series,
            vec![
                (date!(2024 - 03 - 01), 300),
                (date!(2024 - 03 - 02), 0),
                (date!(2024 - 03 - 03), 450),
            ]
        );
    }
}
