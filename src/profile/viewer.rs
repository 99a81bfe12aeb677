use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    backend::{DataSource, DbPath},
    models::{ProfileView, Result},
};

/// Loads the profile page for one explorer
pub struct ProfileViewer {
    source: Arc<dyn DataSource>,
}

impl ProfileViewer {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// `None` when nothing is stored for `uid`
    pub async fn load(&self, uid: &str) -> Result<Option<ProfileView>> {
        let path = DbPath::user(uid)?;
        match self.source.read(&path).await? {
            Some(raw) => {
                info!("Loaded profile for {}", uid);
                Ok(Some(ProfileView::from_remote(uid, &raw)))
            }
            None => {
                warn!("No data found at {}", path);
                Ok(None)
            }
        }
    }
}
