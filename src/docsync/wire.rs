//! Wire types for the Craft document-collection API.

use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::meals::model::Meal;

/// Collection items carry the calendar date only, no time of day.
const CALENDAR_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Serialize)]
pub struct CreateItemsRequest {
    pub items: Vec<CollectionItem>,
}

#[derive(Debug, Serialize)]
pub struct CollectionItem {
    pub meal_name: String,
    pub properties: ItemProperties,
}

#[derive(Debug, Serialize)]
pub struct ItemProperties {
    pub date: String,
    pub meal_type: String,
    pub calories: u32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub key_nutrients: String,
    pub notes: String,
}

impl CollectionItem {
    pub fn from_meal(meal: &Meal) -> Self {
        Self {
            meal_name: meal.name.clone(),
            properties: ItemProperties {
                date: calendar_date(meal.date),
                meal_type: meal.meal_type.as_str().to_string(),
                calories: meal.calories,
                protein_g: meal.protein,
                carbs_g: meal.carbs,
                fat_g: meal.fat,
                key_nutrients: meal.key_nutrients.clone(),
                notes: meal.notes.clone(),
            },
        }
    }
}

fn calendar_date(date: OffsetDateTime) -> String {
    // format_description above cannot fail for a valid date
    date.date().format(CALENDAR_DATE).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct CreatedItemsResponse {
    #[serde(default)]
    pub items: Vec<CreatedItem>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedItem {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteItemsRequest {
    #[serde(rename = "idsToDelete")]
    pub ids_to_delete: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AddBlocksRequest {
    pub blocks: Vec<Block>,
    pub position: BlockPosition,
}

#[derive(Debug, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: String,
    pub markdown: String,
}

impl Block {
    pub fn text(markdown: impl Into<String>) -> Self {
        Self { block_type: "text".into(), markdown: markdown.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockPosition {
    pub position: String,
    #[serde(rename = "pageId")]
    pub page_id: String,
}

impl BlockPosition {
    pub fn end_of(page_id: impl Into<String>) -> Self {
        Self { position: "end".into(), page_id: page_id.into() }
    }
}
