//! Document sync client: mirrors meal records into a remote document
//! collection, one item per meal, with photos and notes attached to the
//! created document.

mod wire;

use bytes::Bytes;
use reqwest::Method;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::meals::model::Meal;
use crate::net::{HttpRequest, RequestExecutor};

use wire::{
    AddBlocksRequest, Block, BlockPosition, CollectionItem, CreateItemsRequest,
    CreatedItemsResponse, DeleteItemsRequest,
};

pub struct DocSyncClient {
    executor: RequestExecutor,
    token: String,
    base_url: String,
}

impl DocSyncClient {
    pub fn new(
        executor: RequestExecutor,
        token: impl Into<String>,
        space_id: &str,
    ) -> Self {
        Self {
            executor,
            token: token.into(),
            base_url: format!("https://connect.craft.do/links/{space_id}/api/v1"),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn authed(&self, method: Method, path_and_query: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path_and_query))
            .header("Authorization", format!("Bearer {}", self.token))
    }

    /// Create one collection item for the meal and return the identifier of
    /// the created document.
    pub async fn create_record(
        &self,
        collection_id: &str,
        meal: &Meal,
    ) -> Result<String, ApiError> {
        let payload = CreateItemsRequest { items: vec![CollectionItem::from_meal(meal)] };
        let encoded = urlencoding::encode(collection_id);
        let request = self
            .authed(Method::POST, &format!("/collections/{encoded}/items"))
            .json(&payload)?;

        let response = self.executor.execute(&request).await?;
        let decoded: CreatedItemsResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::Decoding(format!("create item response: {e}")))?;

        match decoded.items.into_iter().next() {
            Some(item) if !item.id.is_empty() => {
                debug!(doc_id = %item.id, "created remote record");
                Ok(item.id)
            }
            _ => Err(ApiError::EmptyResponse),
        }
    }

    /// Remove a previously created item from the collection.
    pub async fn delete_record(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), ApiError> {
        let payload = DeleteItemsRequest { ids_to_delete: vec![document_id.to_string()] };
        let encoded = urlencoding::encode(collection_id);
        let request = self
            .authed(Method::DELETE, &format!("/collections/{encoded}/items"))
            .json(&payload)?;

        self.executor.execute(&request).await?;
        debug!(doc_id = %document_id, "deleted remote record");
        Ok(())
    }

    /// Upload one photo as raw bytes to the end of the document.
    pub async fn attach_image(&self, document_id: &str, image: &Bytes) -> Result<(), ApiError> {
        let request = self
            .authed(
                Method::POST,
                &format!("/upload?position=end&pageId={document_id}"),
            )
            .header("Content-Type", "image/jpeg")
            .body(image.clone());

        self.executor.execute(&request).await?;
        Ok(())
    }

    /// Append one text block; whitespace-only text is skipped entirely.
    pub async fn append_text(&self, document_id: &str, text: &str) -> Result<(), ApiError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let payload = AddBlocksRequest {
            blocks: vec![Block::text(text)],
            position: BlockPosition::end_of(document_id),
        };
        let request = self.authed(Method::POST, "/blocks").json(&payload)?;

        self.executor.execute(&request).await?;
        Ok(())
    }

    /// Attach all photos in order, then the description. Uploads are
    /// sequential; a failure leaves earlier photos attached, skips the rest,
    /// and propagates immediately.
    pub async fn attach_content(
        &self,
        document_id: &str,
        photos: &[Bytes],
        description: &str,
    ) -> Result<(), ApiError> {
        for (index, photo) in photos.iter().enumerate() {
            if let Err(error) = self.attach_image(document_id, photo).await {
                warn!(doc_id = %document_id, photo_index = index, error = %error, "photo upload failed");
                return Err(error);
            }
        }
        self.append_text(document_id, description).await
    }
}
