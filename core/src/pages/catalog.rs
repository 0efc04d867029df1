use std::fmt;
use std::marker::PhantomData;

use crate::dialog::{ConfirmDialog, ConfirmPrompt};
use crate::error::ApiError;
use crate::form::{FormDraft, FormSchema};
use crate::forms::EditableResource;
use crate::queries::{self, MutationState, QueryState};
use crate::resource::{EntityKind, Resource};
use crate::routes::Route;

use super::App;

/// List of films or actors with delete-behind-confirmation.
pub struct ListPage<R: Resource> {
    dialog: ConfirmDialog<R>,
    deletion: MutationState,
}

impl<R: Resource> fmt::Debug for ListPage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListPage")
            .field("kind", &R::KIND)
            .field("dialog", &self.dialog)
            .field("deletion", &self.deletion)
            .finish()
    }
}

impl<R: Resource> Default for ListPage<R> {
    fn default() -> Self {
        Self {
            dialog: ConfirmDialog::new(),
            deletion: MutationState::Idle,
        }
    }
}

impl<R: Resource> ListPage<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current list through the cache. A failed load is toasted.
    pub fn render(&mut self, app: &mut App) -> QueryState<Vec<R>> {
        let state = queries::fetch_list::<R>(&mut app.api, &mut app.cache);
        if let QueryState::Failed(e) = &state {
            app.report(e);
        }
        state
    }

    pub fn dialog(&self) -> &ConfirmDialog<R> {
        &self.dialog
    }

    pub fn deletion(&self) -> &MutationState {
        &self.deletion
    }

    /// Ask before deleting; nothing is sent yet.
    pub fn request_delete(&mut self, item: R) {
        let singular = R::KIND.singular();
        let prompt = ConfirmPrompt::new(
            format!("Delete {}", singular.to_lowercase()),
            format!(
                "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                item.label()
            ),
        )
        .with_confirm_label("Delete");
        self.dialog.open(item, prompt);
    }

    pub fn cancel_delete(&mut self) {
        self.dialog.cancel();
    }

    /// Send the DELETE for the pending item. No-op without a pending item
    /// or while a delete is already running.
    pub fn confirm_delete(&mut self, app: &mut App) -> &MutationState {
        let Some(item) = self.dialog.confirm() else {
            return &self.deletion;
        };
        self.deletion = MutationState::Pending;
        let result = queries::delete::<R>(&mut app.api, &mut app.cache, item.id());
        self.dialog.finish();

        self.deletion = match result {
            Ok(()) => {
                let kind = R::KIND;
                tracing::info!(%kind, id = item.id(), "deleted");
                app.toasts.show_success(format!(
                    "{} \"{}\" deleted successfully",
                    R::KIND.singular(),
                    item.label()
                ));
                MutationState::Succeeded
            }
            Err(e) => {
                app.report(&e);
                MutationState::Failed(e)
            }
        };
        &self.deletion
    }

    pub fn open_create(&self, app: &mut App) -> Route {
        app.navigate(Route::create(R::KIND))
    }

    pub fn open_edit(&self, app: &mut App, id: &str) -> Route {
        app.navigate(Route::edit(R::KIND, id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// Create or edit form for one resource.
pub struct FormPage<R: EditableResource> {
    mode: FormMode,
    form: FormDraft<R::Form>,
    seeded: bool,
    resource: PhantomData<R>,
}

impl<R: EditableResource> fmt::Debug for FormPage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormPage")
            .field("kind", &R::KIND)
            .field("mode", &self.mode)
            .field("form", &self.form)
            .field("seeded", &self.seeded)
            .finish()
    }
}

impl<R: EditableResource> FormPage<R> {
    pub fn new(mode: FormMode) -> Self {
        Self {
            mode,
            form: FormDraft::new(),
            seeded: false,
            resource: PhantomData,
        }
    }

    /// Page for the current route, if it is this resource's create or edit
    /// route.
    pub fn for_route(route: &Route) -> Option<Self> {
        let mode = match (R::KIND, route) {
            (EntityKind::Films, Route::FilmNew) | (EntityKind::Actors, Route::ActorNew) => {
                FormMode::Create
            }
            (EntityKind::Films, Route::FilmEdit(id)) | (EntityKind::Actors, Route::ActorEdit(id)) => {
                FormMode::Edit(id.clone())
            }
            _ => return None,
        };
        Some(Self::new(mode))
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn form(&self) -> &FormDraft<R::Form> {
        &self.form
    }

    pub fn set(&mut self, field: <R::Form as FormSchema>::Field, value: impl Into<String>) {
        self.form.set(field, value);
    }

    /// Edit mode: fetch the record and seed the draft the first time it
    /// arrives. Create mode is ready immediately.
    pub fn load(&mut self, app: &mut App) -> QueryState<()> {
        let FormMode::Edit(id) = &self.mode else {
            return QueryState::Ready(());
        };
        match queries::fetch_item::<R>(&mut app.api, &mut app.cache, id) {
            QueryState::Ready(record) => {
                if !self.seeded {
                    self.form.reset(record.seed());
                    self.seeded = true;
                }
                QueryState::Ready(())
            }
            QueryState::Loading => QueryState::Loading,
            QueryState::Failed(e) => {
                app.report(&e);
                QueryState::Failed(e)
            }
        }
    }

    /// Validate, save, toast, and return to the list. On failure the draft
    /// is kept so the user can retry.
    pub fn submit(&mut self, app: &mut App) -> Result<R, ApiError> {
        let output = self.form.begin_submit()?;
        let result = match &self.mode {
            FormMode::Create => {
                queries::create::<R>(&mut app.api, &mut app.cache, &R::create_input(output))
            }
            FormMode::Edit(id) => {
                queries::update::<R>(&mut app.api, &mut app.cache, id, &R::update_input(output))
            }
        };
        self.form.finish_submit();

        match result {
            Ok(saved) => {
                let verb = match self.mode {
                    FormMode::Create => "created",
                    FormMode::Edit(_) => "updated",
                };
                let kind = R::KIND;
                tracing::info!(%kind, id = saved.id(), verb, "saved");
                app.toasts
                    .show_success(format!("{} {verb} successfully", R::KIND.singular()));
                app.navigate(Route::list(R::KIND));
                Ok(saved)
            }
            Err(e) => {
                app.report(&e);
                Err(e)
            }
        }
    }

    pub fn cancel(&self, app: &mut App) -> Route {
        app.navigate(Route::list(R::KIND))
    }
}
