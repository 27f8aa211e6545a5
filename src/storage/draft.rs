use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};

use super::{LocalStorage, Result};
use crate::practice::PracticeForm;

/// Key under which the in-progress practice form is kept.
pub const DRAFT_KEY: &str = "aceNextPracticeForm";

/// The saved, not-yet-submitted practice form.
#[derive(Clone)]
pub struct DraftStore {
    storage: Arc<LocalStorage>,
}

impl DraftStore {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, form: &PracticeForm) -> Result<()> {
        let serialized = serde_json::to_string(&form.to_draft())?;
        self.storage.set_item(DRAFT_KEY, &serialized)?;
        debug!("💾 Draft saved");
        Ok(())
    }

    pub fn load(&self) -> Option<PracticeForm> {
        let raw = self.storage.get_item(DRAFT_KEY)?;
        match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
            Ok(draft) => Some(PracticeForm::from_draft(&draft)),
            Err(e) => {
                warn!("Could not load saved form data: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(DRAFT_KEY)
    }

    pub fn exists(&self) -> bool {
        self.storage.get_item(DRAFT_KEY).is_some()
    }
}
