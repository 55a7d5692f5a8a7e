use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::meals::model::{Meal, MealType};

/// Local record store contract the sync layer depends on.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Insert the record, replacing any prior version with the same id.
    async fn insert(&self, meal: &Meal) -> anyhow::Result<()>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;

    /// Records with `start <= date < end`, ordered by date ascending.
    async fn fetch_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<Meal>>;

    /// All records, ordered by date descending.
    async fn fetch_all(&self) -> anyhow::Result<Vec<Meal>>;

    /// Records for one calendar day (UTC), ordered by date ascending.
    async fn fetch_for_day(&self, day: Date) -> anyhow::Result<Vec<Meal>> {
        let start = day.midnight().assume_utc();
        let end = start + time::Duration::days(1);
        self.fetch_range(start, end).await
    }
}

/// SQLite-backed store. Photos live in a companion table, one row per photo
/// in display order, written in the same transaction as the meal row.
pub struct SqliteMealStore {
    pool: SqlitePool,
}

impl SqliteMealStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite://meals.db` or `sqlite::memory:`, and ensure the schema.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse sqlite url {url}"))?
            .create_if_missing(true);
        // a single connection keeps in-memory databases coherent
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("connect to sqlite")?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meals (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                date          INTEGER NOT NULL,
                meal_type     TEXT NOT NULL,
                calories      INTEGER NOT NULL,
                protein       REAL NOT NULL,
                carbs         REAL NOT NULL,
                fat           REAL NOT NULL,
                key_nutrients TEXT NOT NULL,
                notes         TEXT NOT NULL,
                remote_doc_id TEXT,
                created_at    INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create meals table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meal_photos (
                meal_id  TEXT NOT NULL,
                position INTEGER NOT NULL,
                data     BLOB NOT NULL,
                PRIMARY KEY (meal_id, position)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create meal_photos table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date)")
            .execute(&self.pool)
            .await
            .context("create meals date index")?;

        Ok(())
    }

    async fn photos_for(&self, meal_id: &str) -> anyhow::Result<Vec<Bytes>> {
        let rows: Vec<(Vec<u8>,)> = sqlx::query_as(
            "SELECT data FROM meal_photos WHERE meal_id = ?1 ORDER BY position ASC",
        )
        .bind(meal_id)
        .fetch_all(&self.pool)
        .await
        .context("fetch meal photos")?;
        Ok(rows.into_iter().map(|(data,)| Bytes::from(data)).collect())
    }

    async fn hydrate(&self, rows: Vec<MealRow>) -> anyhow::Result<Vec<Meal>> {
        let mut meals = Vec::with_capacity(rows.len());
        for row in rows {
            let photos = self.photos_for(&row.0).await?;
            meals.push(row_to_meal(row, photos)?);
        }
        Ok(meals)
    }
}

type MealRow = (
    String,         // id
    String,         // name
    i64,            // date (unix seconds)
    String,         // meal_type
    i64,            // calories
    f64,            // protein
    f64,            // carbs
    f64,            // fat
    String,         // key_nutrients
    String,         // notes
    Option<String>, // remote_doc_id
    i64,            // created_at
);

const MEAL_COLUMNS: &str =
    "id, name, date, meal_type, calories, protein, carbs, fat, key_nutrients, notes, remote_doc_id, created_at";

fn row_to_meal(row: MealRow, photos: Vec<Bytes>) -> anyhow::Result<Meal> {
    let (id, name, date, meal_type, calories, protein, carbs, fat, key_nutrients, notes, remote_doc_id, created_at) =
        row;
    Ok(Meal {
        id: Uuid::parse_str(&id).with_context(|| format!("parse meal id {id}"))?,
        name,
        date: OffsetDateTime::from_unix_timestamp(date).context("meal date out of range")?,
        meal_type: MealType::parse(&meal_type),
        calories: u32::try_from(calories).unwrap_or(0),
        protein,
        carbs,
        fat,
        key_nutrients,
        notes,
        photos,
        remote_doc_id,
        created_at: OffsetDateTime::from_unix_timestamp(created_at)
            .context("created_at out of range")?,
    })
}

#[async_trait]
impl MealStore for SqliteMealStore {
    async fn insert(&self, meal: &Meal) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let id = meal.id.to_string();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO meals
                (id, name, date, meal_type, calories, protein, carbs, fat,
                 key_nutrients, notes, remote_doc_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&id)
        .bind(&meal.name)
        .bind(meal.date.unix_timestamp())
        .bind(meal.meal_type.as_str())
        .bind(i64::from(meal.calories))
        .bind(meal.protein)
        .bind(meal.carbs)
        .bind(meal.fat)
        .bind(&meal.key_nutrients)
        .bind(&meal.notes)
        .bind(meal.remote_doc_id.as_deref())
        .bind(meal.created_at.unix_timestamp())
        .execute(&mut *tx)
        .await
        .context("insert meal")?;

        sqlx::query("DELETE FROM meal_photos WHERE meal_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .context("clear meal photos")?;

        for (position, photo) in meal.photos.iter().enumerate() {
            sqlx::query("INSERT INTO meal_photos (meal_id, position, data) VALUES (?1, ?2, ?3)")
                .bind(&id)
                .bind(position as i64)
                .bind(photo.as_ref())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("insert photo {position}"))?;
        }

        tx.commit().await.context("commit meal insert")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        let id = id.to_string();
        let mut tx = self.pool.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM meal_photos WHERE meal_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .context("delete meal photos")?;
        sqlx::query("DELETE FROM meals WHERE id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .context("delete meal")?;
        tx.commit().await.context("commit meal delete")?;
        Ok(())
    }

    async fn fetch_range(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<Meal>> {
        let rows: Vec<MealRow> = sqlx::query_as(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE date >= ?1 AND date < ?2 ORDER BY date ASC",
        ))
        .bind(start.unix_timestamp())
        .bind(end.unix_timestamp())
        .fetch_all(&self.pool)
        .await
        .context("fetch meals in range")?;
        self.hydrate(rows).await
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<Meal>> {
        let rows: Vec<MealRow> =
            sqlx::query_as(&format!("SELECT {MEAL_COLUMNS} FROM meals ORDER BY date DESC"))
                .fetch_all(&self.pool)
                .await
                .context("fetch all meals")?;
        self.hydrate(rows).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::meals::model::Meal;

    use super::MealStore;

    /// Vec-backed store fake for orchestrator and analytics tests.
    #[derive(Default)]
    pub struct InMemoryStore {
        meals: Mutex<Vec<Meal>>,
    }

    #[async_trait]
    impl MealStore for InMemoryStore {
        async fn insert(&self, meal: &Meal) -> anyhow::Result<()> {
            let mut meals = self.meals.lock().unwrap();
            meals.retain(|m| m.id != meal.id);
            meals.push(meal.clone());
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
            self.meals.lock().unwrap().retain(|m| m.id != id);
            Ok(())
        }

        async fn fetch_range(
            &self,
            start: OffsetDateTime,
            end: OffsetDateTime,
        ) -> anyhow::Result<Vec<Meal>> {
            let mut meals: Vec<Meal> = self
                .meals
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.date >= start && m.date < end)
                .cloned()
                .collect();
            meals.sort_by_key(|m| m.date);
            Ok(meals)
        }

        async fn fetch_all(&self) -> anyhow::Result<Vec<Meal>> {
            let mut meals: Vec<Meal> = self.meals.lock().unwrap().clone();
            meals.sort_by_key(|m| std::cmp::Reverse(m.date));
            Ok(meals)
        }
    }
}
