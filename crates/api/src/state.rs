use crate::fetch::ImageFetcher;
use inference::Predictor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub fetcher: Arc<ImageFetcher>,
}

impl AppState {
    pub fn new(predictor: Predictor, fetcher: ImageFetcher) -> Self {
        Self {
            predictor: Arc::new(predictor),
            fetcher: Arc::new(fetcher),
        }
    }
}
