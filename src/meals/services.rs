use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::docsync::DocSyncClient;
use crate::error::ApiError;
use crate::meals::model::{Meal, MealType, NutritionEstimate};
use crate::meals::store::MealStore;
use crate::net::{HttpTransport, RequestExecutor, RetryConfig};
use crate::vision::VisionClient;

/// Outcome of a successful `save_with_sync`.
///
/// `attach_error` is set when the remote record was created but enriching it
/// with photos or notes failed; the save as a whole still succeeded and the
/// record is committed locally with its remote id.
#[derive(Debug)]
pub struct SyncReport {
    pub meal: Meal,
    pub attach_error: Option<ApiError>,
}

/// Orchestrates the dual write: remote record first, local commit second.
///
/// Remote create and delete are hard failures that leave the local store
/// untouched, so the two stores cannot diverge silently. Content attachment
/// is best-effort enrichment and never rolls anything back.
pub struct SyncService {
    store: Arc<dyn MealStore>,
    transport: Arc<dyn HttpTransport>,
    retry: RetryConfig,
}

impl SyncService {
    pub fn new(store: Arc<dyn MealStore>, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_retry(store, transport, RetryConfig::default())
    }

    pub fn with_retry(
        store: Arc<dyn MealStore>,
        transport: Arc<dyn HttpTransport>,
        retry: RetryConfig,
    ) -> Self {
        Self { store, transport, retry }
    }

    fn executor(&self) -> RequestExecutor {
        RequestExecutor::with_retry(self.transport.clone(), self.retry.clone())
    }

    fn doc_client(&self, creds: &Credentials) -> DocSyncClient {
        DocSyncClient::new(self.executor(), creds.craft_token.clone(), &creds.space_id)
    }

    /// Estimate nutrition for a set of meal photos.
    pub async fn analyze_photos(
        &self,
        creds: &Credentials,
        images: &[Bytes],
        description: &str,
        meal_type: MealType,
    ) -> anyhow::Result<NutritionEstimate> {
        anyhow::ensure!(!creds.gemini_key.is_empty(), "analysis API key is not configured");
        let client = VisionClient::new(self.executor(), creds.gemini_key.clone());
        let estimate = client
            .analyze(images, description, meal_type)
            .await
            .context("analyze meal photos")?;
        Ok(estimate)
    }

    /// Save a meal, mirroring it to the remote collection first.
    ///
    /// With incomplete credentials the remote side is skipped entirely and
    /// the meal commits locally with no remote id. With valid credentials a
    /// failed remote create aborts the save before anything touches the
    /// local store.
    pub async fn save_with_sync(
        &self,
        creds: &Credentials,
        mut meal: Meal,
    ) -> anyhow::Result<SyncReport> {
        let mut attach_error = None;

        if creds.is_valid() {
            let client = self.doc_client(creds);
            let doc_id = client
                .create_record(&creds.collection_id, &meal)
                .await
                .context("create remote record")?;
            meal.remote_doc_id = Some(doc_id.clone());

            if !meal.photos.is_empty() || !meal.notes.is_empty() {
                if let Err(error) =
                    client.attach_content(&doc_id, &meal.photos, &meal.notes).await
                {
                    // best-effort enrichment: the record exists remotely, keep going
                    warn!(meal_id = %meal.id, doc_id = %doc_id, error = %error, "attach content failed");
                    attach_error = Some(error);
                }
            }
        } else {
            debug!(meal_id = %meal.id, "credentials incomplete, saving locally only");
        }

        self.store.insert(&meal).await.context("commit meal locally")?;
        info!(meal_id = %meal.id, synced = meal.remote_doc_id.is_some(), "meal saved");
        Ok(SyncReport { meal, attach_error })
    }

    /// Save locally without any remote call, regardless of credentials.
    pub async fn save_local(&self, meal: Meal) -> anyhow::Result<Meal> {
        self.store.insert(&meal).await.context("commit meal locally")?;
        Ok(meal)
    }

    /// Delete a meal, remote record first. A failed remote delete preserves
    /// the local record.
    pub async fn delete_with_sync(&self, creds: &Credentials, meal: &Meal) -> anyhow::Result<()> {
        if creds.is_valid() {
            if let Some(doc_id) = &meal.remote_doc_id {
                self.doc_client(creds)
                    .delete_record(&creds.collection_id, doc_id)
                    .await
                    .context("delete remote record")?;
            }
        }
        self.store.delete(meal.id).await.context("delete meal locally")?;
        info!(meal_id = %meal.id, "meal deleted");
        Ok(())
    }
}
