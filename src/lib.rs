//! Sync core for the MacroHunt meal tracker.
//!
//! The flow per user action: photos go to the vision endpoint for a
//! nutrition estimate ([`vision`]), and a saved meal is written to the remote
//! document collection before it commits to the local store
//! ([`meals::services`]). All outbound traffic runs through one retrying
//! request executor ([`net`]).

pub mod config;
pub mod docsync;
pub mod error;
pub mod meals;
pub mod net;
pub mod vision;

pub use config::{Credentials, CredentialsStore, MacroSplit};
pub use docsync::DocSyncClient;
pub use error::ApiError;
pub use meals::model::{Meal, MealType, NutritionEstimate};
pub use meals::services::{SyncReport, SyncService};
pub use meals::store::{MealStore, SqliteMealStore};
pub use net::{HttpTransport, ReqwestTransport};
pub use vision::{VisionClient, MAX_IMAGE_BYTES};
