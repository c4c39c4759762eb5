//! Admin CRUD
//!
//! One controller shape for every managed resource. The resource type
//! supplies paths, list decoding, and field validation through
//! [`AdminResource`]; the controller supplies the list/form/notice
//! state machine around it.

use std::sync::Arc;
use std::sync::RwLock;

use serde_json::Value;
use uuid::Uuid;

use storefront_core::error::ValidationError;
use storefront_core::query::{page_count, ListResult};
use storefront_core::resource::AdminResource;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::session::TokenProvider;

/// Outcome of a deletion prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Whether a form creates a new entity or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// An open form and the fields typed into it so far
#[derive(Debug, Clone)]
pub struct FormDraft<F> {
    mode: FormMode,
    target: Option<Uuid>,
    pub fields: F,
}

impl<F> FormDraft<F> {
    fn create(fields: F) -> Self {
        Self {
            mode: FormMode::Create,
            target: None,
            fields,
        }
    }

    fn edit(target: Uuid, fields: F) -> Self {
        Self {
            mode: FormMode::Edit,
            target: Some(target),
            fields,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn target(&self) -> Option<Uuid> {
        self.target
    }
}

/// Admin list, form, and feedback state for one resource
#[derive(Clone)]
pub struct AdminState<R: AdminResource> {
    pub items: Vec<R>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub loading: bool,
    pub draft: Option<FormDraft<R::Fields>>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl<R: AdminResource> Default for AdminState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            limit: 1,
            loading: false,
            draft: None,
            notice: None,
            error: None,
        }
    }
}

/// CRUD controller for one [`AdminResource`]
pub struct AdminController<R: AdminResource> {
    api: ApiClient,
    session: Arc<dyn TokenProvider>,
    state: RwLock<AdminState<R>>,
}

impl<R: AdminResource> AdminController<R> {
    pub fn new(api: ApiClient, session: Arc<dyn TokenProvider>) -> Self {
        Self {
            api,
            session,
            state: RwLock::new(AdminState::default()),
        }
    }

    /// Current state
    pub fn state(&self) -> AdminState<R> {
        self.state.read().unwrap().clone()
    }

    /// Number of pages for the current total and page size
    pub fn page_count(&self) -> u32 {
        let state = self.state.read().unwrap();
        page_count(state.total, state.limit)
    }

    /// Fetch the current page of the list
    pub async fn reload(&self) -> ClientResult<()> {
        let page = self.state.read().unwrap().page;
        self.state.write().unwrap().loading = true;

        let result = self.fetch_page(page).await;

        let mut state = self.state.write().unwrap();
        state.loading = false;
        match result {
            Ok(list) => {
                state.items = list.items;
                state.total = list.total;
                state.limit = list.limit;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(match &e {
                    ClientError::Api { message, .. } => message.clone(),
                    _ => format!(
                        "Failed to load {}",
                        R::collection_path().trim_start_matches('/')
                    ),
                });
                Err(e)
            }
        }
    }

    async fn fetch_page(&self, page: u32) -> ClientResult<ListResult<R>> {
        let params = R::list_params(page);
        let body = self
            .api
            .get_with_params(R::collection_path(), &params, None)
            .await?;
        Ok(R::decode_list(body)?)
    }

    /// Jump to a page and reload
    pub async fn set_page(&self, page: u32) -> ClientResult<()> {
        self.state.write().unwrap().page = page.max(1);
        self.reload().await
    }

    /// Open an empty creation form
    pub fn open_create(&self) {
        self.state.write().unwrap().draft = Some(FormDraft::create(R::Fields::default()));
    }

    /// Open an edit form seeded from an existing entity
    pub fn open_edit(&self, entity: &R) {
        self.state.write().unwrap().draft = Some(FormDraft::edit(entity.id(), entity.to_fields()));
    }

    /// Replace the fields of the open form, if one is open
    pub fn set_fields(&self, fields: R::Fields) {
        if let Some(draft) = self.state.write().unwrap().draft.as_mut() {
            draft.fields = fields;
        }
    }

    /// Close the form without submitting
    pub fn close_form(&self) {
        self.state.write().unwrap().draft = None;
    }

    /// Validate and submit the open form
    ///
    /// On success the form closes and the list reloads; on any failure
    /// the form stays open with its fields intact.
    pub async fn submit(&self) -> ClientResult<()> {
        let draft = {
            let mut state = self.state.write().unwrap();
            state.error = None;
            state.notice = None;
            state.draft.clone()
        };
        let draft = match draft {
            Some(draft) => draft,
            None => return Ok(()),
        };

        match self.try_submit(&draft).await {
            Ok(()) => {
                let mut state = self.state.write().unwrap();
                state.notice = Some(match draft.mode {
                    FormMode::Create => format!("{} created", R::KIND),
                    FormMode::Edit => format!("{} updated", R::KIND),
                });
                state.draft = None;
                Ok(())
            }
            Err(e) => {
                self.state.write().unwrap().error = Some(match &e {
                    ClientError::Api { message, .. } => message.clone(),
                    ClientError::Validation(v) => v.to_string(),
                    _ => "Failed to submit".to_string(),
                });
                Err(e)
            }
        }
    }

    async fn try_submit(&self, draft: &FormDraft<R::Fields>) -> ClientResult<()> {
        let token = self
            .session
            .token()
            .ok_or(ValidationError::MissingToken)?;
        let payload = R::validate(&draft.fields)?;

        match draft.target {
            Some(id) => {
                let _: Value = self
                    .api
                    .put_data(&R::item_path(id), &payload, Some(&token))
                    .await?;
            }
            None => {
                let _: Value = self
                    .api
                    .post_data(R::collection_path(), &payload, Some(&token))
                    .await?;
            }
        }

        // Reload failures record themselves; the mutation already landed.
        let _ = self.reload().await;
        Ok(())
    }

    /// Question to ask before deleting an entity
    pub fn remove_prompt(entity: &R) -> String {
        format!("Delete {} \"{}\"?", R::KIND.to_lowercase(), entity.label())
    }

    /// Delete an entity after confirmation
    ///
    /// Returns `Ok(false)` when declined; no request is sent.
    pub async fn remove(&self, entity: &R, confirmation: Confirmation) -> ClientResult<bool> {
        if self.session.token().is_none() {
            let e = ClientError::from(ValidationError::MissingToken);
            self.state.write().unwrap().error = Some(e.to_string());
            return Err(e);
        }
        if confirmation == Confirmation::Declined {
            return Ok(false);
        }

        match self.try_remove(entity).await {
            Ok(()) => {
                self.state.write().unwrap().notice = Some(format!("{} deleted", R::KIND));
                Ok(true)
            }
            Err(e) => {
                self.state.write().unwrap().error = Some(match &e {
                    ClientError::Api { message, .. } => message.clone(),
                    ClientError::Validation(v) => v.to_string(),
                    _ => "Failed to delete".to_string(),
                });
                Err(e)
            }
        }
    }

    async fn try_remove(&self, entity: &R) -> ClientResult<()> {
        let token = self
            .session
            .token()
            .ok_or(ValidationError::MissingToken)?;
        self.api
            .delete(&R::item_path(entity.id()), Some(&token))
            .await?;

        // Reload failures record themselves; the mutation already landed.
        let _ = self.reload().await;
        Ok(())
    }
}
