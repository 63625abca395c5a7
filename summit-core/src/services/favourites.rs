//! Favourite peaks. Every call returns the full id list, which replaces the
//! cached one.

use crate::http::{ApiClient, ApiError, ApiRequest};
use serde::Serialize;
use tokio::sync::watch;

pub const FAVOURITES_PATH: &str = "/api/summit-favourites";

#[derive(Serialize)]
struct AddFavourite {
    peak_id: i64,
}

pub struct FavouritesService {
    api: ApiClient,
    ids: watch::Sender<Vec<i64>>,
}

impl FavouritesService {
    pub fn new(api: ApiClient) -> Self {
        let (ids, _rx) = watch::channel(Vec::new());
        Self { api, ids }
    }

    pub async fn load(&self) -> Result<Vec<i64>, ApiError> {
        self.apply(ApiRequest::get(FAVOURITES_PATH)).await
    }

    pub async fn add(&self, peak_id: i64) -> Result<Vec<i64>, ApiError> {
        self.apply(ApiRequest::post(FAVOURITES_PATH).json(&AddFavourite { peak_id })?)
            .await
    }

    pub async fn remove(&self, peak_id: i64) -> Result<Vec<i64>, ApiError> {
        self.apply(ApiRequest::delete(FAVOURITES_PATH).query("peak_id", peak_id))
            .await
    }

    async fn apply(&self, request: ApiRequest) -> Result<Vec<i64>, ApiError> {
        // The backend sends null for an empty list
        let ids: Option<Vec<i64>> = self.api.send_json(request).await?;
        let ids = ids.unwrap_or_default();
        self.ids.send_replace(ids.clone());
        Ok(ids)
    }

    /// Whether `peak_id` is in the last list received.
    pub fn is_favourite(&self, peak_id: i64) -> bool {
        self.ids.borrow().contains(&peak_id)
    }

    pub fn current(&self) -> Vec<i64> {
        self.ids.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<i64>> {
        self.ids.subscribe()
    }
}
