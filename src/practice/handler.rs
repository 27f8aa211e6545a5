use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use super::form::{FieldError, FormField, PracticeForm};
use super::{FormError, Result};
use crate::backend::BackendClient;
use crate::navigation::Page;
use crate::notifications::Notifier;
use crate::storage::DraftStore;

pub const FIX_ERRORS_MESSAGE: &str = "❌ Please fix the errors before submitting";
pub const SUBMIT_SUCCESS_MESSAGE: &str = "🚀 Interview session starting...";
pub const SUBMIT_FAILURE_MESSAGE: &str = "❌ Something went wrong. Please try again.";

/// Drives the practice-setup page: inline validation, draft auto-save and
/// submission to the backend.
pub struct PracticeFormHandler {
    form: PracticeForm,
    drafts: DraftStore,
    backend: BackendClient,
    notifier: Arc<dyn Notifier>,
    redirect_delay: Duration,
    is_submitting: AtomicBool,
}

/// Clears the in-flight flag however the submit future ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PracticeFormHandler {
    pub fn new(
        drafts: DraftStore,
        backend: BackendClient,
        notifier: Arc<dyn Notifier>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            form: PracticeForm::new(),
            drafts,
            backend,
            notifier,
            redirect_delay,
            is_submitting: AtomicBool::new(false),
        }
    }

    pub fn form(&self) -> &PracticeForm {
        &self.form
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting.load(Ordering::SeqCst)
    }

    /// Restores the saved draft, if any. Returns whether one was found.
    pub fn load_draft(&mut self) -> bool {
        match self.drafts.load() {
            Some(form) => {
                info!("📝 Restored practice form draft");
                self.form = form;
                true
            }
            None => false,
        }
    }

    /// Stores `value`, saves the draft and returns the inline result for
    /// that field.
    pub fn set_field(&mut self, field: FormField, value: &str) -> std::result::Result<(), FieldError> {
        self.form.set(field, value);
        if let Err(e) = self.drafts.save(&self.form) {
            warn!("Could not save practice form draft: {}", e);
        }
        self.form.validate_field(field)
    }

    /// Clears the form and forgets the draft.
    pub fn reset(&mut self) -> Result<()> {
        self.form.clear();
        self.drafts.clear()?;
        info!("🧹 Practice form reset");
        Ok(())
    }

    /// Validates and submits the form. On success the draft is cleared and
    /// the next page is returned after the redirect delay.
    pub async fn submit(&self) -> Result<Page> {
        if self
            .is_submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Submit ignored, one is already in flight");
            return Err(FormError::AlreadySubmitting);
        }
        let _guard = SubmitGuard(&self.is_submitting);

        if let Err(errors) = self.form.validate() {
            for e in &errors {
                warn!("Invalid field {}", e);
            }
            self.notifier.error(FIX_ERRORS_MESSAGE);
            return Err(FormError::Invalid(errors));
        }

        let job_info = self.form.to_job_info();
        info!("📨 Submitting practice form for role: {}", job_info.job_role);

        match self.backend.save_job_info(&job_info).await {
            Ok(()) => {
                if let Err(e) = self.drafts.clear() {
                    warn!("Could not clear practice form draft: {}", e);
                }
                self.notifier.success(SUBMIT_SUCCESS_MESSAGE);
                tokio::time::sleep(self.redirect_delay).await;
                info!("➡️ Navigating to {}", Page::Session);
                Ok(Page::Session)
            }
            Err(e) => {
                error!("❌ Practice form submission failed: {}", e);
                self.notifier.error(SUBMIT_FAILURE_MESSAGE);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{NotificationKind, ToastCenter};
    use crate::storage::LocalStorage;

    fn offline_handler(dir: &tempfile::TempDir) -> (PracticeFormHandler, Arc<ToastCenter>, DraftStore) {
        let storage = Arc::new(LocalStorage::open(dir.path().join("store.json")));
        let toasts = Arc::new(ToastCenter::new(Duration::from_secs(4)));
        let backend = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let handler = PracticeFormHandler::new(
            DraftStore::new(storage.clone()),
            backend,
            toasts.clone(),
            Duration::from_millis(1),
        );
        (handler, toasts, DraftStore::new(storage))
    }

    #[test]
    fn test_set_field_saves_draft_and_validates_inline() {
        let dir = tempfile::tempdir().unwrap();
        let (mut handler, _toasts, drafts) = offline_handler(&dir);

        let err = handler.set_field(FormField::Role, "x").unwrap_err();
        assert_eq!(err.field, FormField::Role);
        assert!(handler.set_field(FormField::Role, "Backend Engineer").is_ok());

        let saved = drafts.load().unwrap();
        assert_eq!(saved.get(FormField::Role), "Backend Engineer");
    }

    #[test]
    fn test_load_draft_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let (mut handler, _toasts, drafts) = offline_handler(&dir);
        assert!(!handler.load_draft());

        drafts
            .save(&PracticeForm::new().with(FormField::Company, "Acme"))
            .unwrap();
        assert!(handler.load_draft());
        assert_eq!(handler.form().get(FormField::Company), "Acme");

        handler.reset().unwrap();
        assert_eq!(handler.form().get(FormField::Company), "");
        assert!(!drafts.exists());
    }

    #[tokio::test]
    async fn test_invalid_submit_notifies_and_keeps_flag_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, toasts, _drafts) = offline_handler(&dir);

        let err = handler.submit().await.unwrap_err();
        match err {
            FormError::Invalid(errors) => assert_eq!(errors[0].field, FormField::Role),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(toasts.contains(NotificationKind::Error, "fix the errors"));
        assert!(!handler.is_submitting());
    }

    #[tokio::test]
    async fn test_unreachable_backend_keeps_draft() {
        let dir = tempfile::tempdir().unwrap();
        let (mut handler, toasts, drafts) = offline_handler(&dir);
        handler.set_field(FormField::Role, "Data Analyst").unwrap();

        let err = handler.submit().await.unwrap_err();
        assert!(matches!(err, FormError::Backend(_)));
        assert!(toasts.contains(NotificationKind::Error, "Something went wrong"));
        assert!(drafts.exists());
        assert!(!handler.is_submitting());
    }
}
