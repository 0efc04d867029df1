//! Command handlers. Each one drives a page controller the way a screen
//! would: fill the form, submit, then let `main` print the toasts.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context};
use catalog_core::dialog::ConfirmPrompt;
use catalog_core::form::FormSchema;
use catalog_core::forms::{
    ActorField, ConfirmSignUpField, EditableResource, FilmField, ForgotPasswordField, LoginField,
    ResetPasswordField,
};
use catalog_core::pages::{
    ConfirmSignUpPage, FormMode, FormPage, ForgotPasswordPage, ListPage, LoginPage, ProfilePage,
    ResetPasswordPage,
};
use catalog_core::{
    Actor, ApiError, App, AuthError, CatalogApi, CatalogClient, FileStore, Film, Gateway,
    MutationState, QueryState, Route, Router, SessionManager,
};

use crate::cli::{ActorCommand, ActorFields, Command, Config, FilmCommand, FilmFields};
use crate::render::{self, Tabular};
use crate::transport::UreqTransport;

type FieldOf<R> = <<R as EditableResource>::Form as FormSchema>::Field;

/// Terminal streams plus output preferences.
pub struct Console<'a> {
    pub input: &'a mut dyn BufRead,
    pub output: &'a mut dyn Write,
    pub json: bool,
}

impl Console<'_> {
    fn print(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask a yes/no question; anything but "y" or "yes" declines.
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> anyhow::Result<bool> {
        write!(
            self.output,
            "{}\n{}\n{}? [y/N] ",
            prompt.title, prompt.message, prompt.confirm_label
        )?;
        self.output.flush()?;
        let answer = self.read_line()?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Wire the core to the real transport and the session file.
pub fn build_app(config: &Config) -> anyhow::Result<App> {
    let store = FileStore::open(&config.session_file).with_context(|| {
        format!(
            "cannot open session file {}",
            config.session_file.display()
        )
    })?;
    let gateway = Gateway::new(
        UreqTransport::new(config.timeout()),
        SessionManager::new(store),
        Router::at(Route::Login),
    );
    Ok(App::new(CatalogApi::new(
        CatalogClient::new(&config.base_url),
        gateway,
    )))
}

pub fn run(app: &mut App, command: Command, console: &mut Console<'_>) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => login(app, username, password, console),
        Command::Logout => {
            app.logout();
            console.print("Signed out")
        }
        Command::Whoami => whoami(app, console),
        Command::Films { action } => catalog::<Film>(app, film_action(action), console),
        Command::Actors { action } => catalog::<Actor>(app, actor_action(action), console),
        Command::ForgotPassword { username } => forgot_password(app, username, console),
        Command::ResetPassword {
            username,
            code,
            new_password,
            confirm_password,
        } => {
            app.navigate(Route::ResetPassword {
                username: Some(username),
            });
            let mut page = ResetPasswordPage::open(app);
            let confirm_password = confirm_password.unwrap_or_else(|| new_password.clone());
            page.set(ResetPasswordField::Code, code);
            page.set(ResetPasswordField::NewPassword, new_password);
            page.set(ResetPasswordField::ConfirmPassword, confirm_password);
            page.submit(app)
                .map_err(|e| reported("password reset failed", e))?;
            Ok(())
        }
        Command::ConfirmSignup { username, code } => {
            app.navigate(Route::ConfirmSignUp {
                username: Some(username),
            });
            let mut page = ConfirmSignUpPage::open(app);
            page.set(ConfirmSignUpField::Code, code);
            page.submit(app)
                .map_err(|e| reported("confirmation failed", e))?;
            Ok(())
        }
        Command::ResendCode { username } => {
            app.navigate(Route::ConfirmSignUp {
                username: Some(username),
            });
            let mut page = ConfirmSignUpPage::open(app);
            page.resend_code(app)
                .map_err(|e| reported("could not resend the code", e))?;
            Ok(())
        }
    }
}

/// The page already toasted the failure, so only the action is named here.
/// Form errors are spelled out since they are never toasted.
fn reported(action: &str, err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Validation(errors) => anyhow!("{action}: {errors}"),
        _ => anyhow!("{action}"),
    }
}

fn require_session(app: &mut App, route: Route) -> anyhow::Result<()> {
    if app.navigate(route) == Route::Login {
        bail!("not signed in; run `catalog login` first");
    }
    Ok(())
}

fn login(
    app: &mut App,
    username: String,
    password: Option<String>,
    console: &mut Console<'_>,
) -> anyhow::Result<()> {
    let mut page = LoginPage::open(app);
    if app.route() != &Route::Login {
        return console.print("Already signed in; run `catalog logout` to switch accounts");
    }

    let password = match password {
        Some(password) => password,
        None => {
            write!(console.output, "Password: ")?;
            console.output.flush()?;
            console.read_line()?
        }
    };
    page.set(LoginField::Username, username);
    page.set(LoginField::Password, password);

    match page.submit(app) {
        Ok(_) => Ok(()),
        Err(ApiError::Auth(AuthError::UnconfirmedAccount { username, .. })) => Err(anyhow!(
            "account not confirmed; run `catalog confirm-signup -u {username} --code <code>`"
        )),
        Err(e) => Err(reported("login failed", e)),
    }
}

fn whoami(app: &mut App, console: &mut Console<'_>) -> anyhow::Result<()> {
    require_session(app, Route::Profile)?;
    match ProfilePage.load(app) {
        QueryState::Ready(user) if console.json => {
            console.print(&serde_json::to_string_pretty(&user)?)
        }
        QueryState::Ready(user) => console.print(&render::user_detail(&user)),
        QueryState::Failed(e) => Err(reported("could not load the profile", e)),
        QueryState::Loading => bail!("profile request already in flight"),
    }
}

fn forgot_password(
    app: &mut App,
    username: String,
    console: &mut Console<'_>,
) -> anyhow::Result<()> {
    let mut page = ForgotPasswordPage::new();
    page.set(ForgotPasswordField::Username, username.clone());
    page.submit(app)
        .map_err(|e| reported("could not request a reset code", e))?;
    console.print(&format!(
        "Next: catalog reset-password -u {username} --code <code> --new-password <password>"
    ))
}

// ---------------------------------------------------------------------------
// Films and actors
// ---------------------------------------------------------------------------

/// A catalog command with its form input already mapped to form fields.
enum CatalogAction<R: EditableResource> {
    List,
    Show(String),
    Create(Vec<(FieldOf<R>, String)>),
    Edit(String, Vec<(FieldOf<R>, String)>),
    Delete { id: String, yes: bool },
}

fn film_action(command: FilmCommand) -> CatalogAction<Film> {
    match command {
        FilmCommand::List => CatalogAction::List,
        FilmCommand::Show { id } => CatalogAction::Show(id),
        FilmCommand::Create { fields } => CatalogAction::Create(film_entries(fields)),
        FilmCommand::Edit { id, fields } => CatalogAction::Edit(id, film_entries(fields)),
        FilmCommand::Delete { id, yes } => CatalogAction::Delete { id, yes },
    }
}

fn actor_action(command: ActorCommand) -> CatalogAction<Actor> {
    match command {
        ActorCommand::List => CatalogAction::List,
        ActorCommand::Show { id } => CatalogAction::Show(id),
        ActorCommand::Create { fields } => CatalogAction::Create(actor_entries(fields)),
        ActorCommand::Edit { id, fields } => CatalogAction::Edit(id, actor_entries(fields)),
        ActorCommand::Delete { id, yes } => CatalogAction::Delete { id, yes },
    }
}

fn film_entries(fields: FilmFields) -> Vec<(FilmField, String)> {
    [
        (FilmField::Title, fields.title),
        (FilmField::Description, fields.description),
        (FilmField::ImagePath, fields.image_path),
        (FilmField::ReleaseYear, fields.release_year),
        (FilmField::Rating, fields.rating),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .collect()
}

fn actor_entries(fields: ActorFields) -> Vec<(ActorField, String)> {
    [
        (ActorField::FirstName, fields.first_name),
        (ActorField::LastName, fields.last_name),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .collect()
}

/// Printing of a single record; films and actors show different fields.
trait Detail {
    fn detail(&self) -> String;
}

impl Detail for Film {
    fn detail(&self) -> String {
        render::film_detail(self)
    }
}

impl Detail for Actor {
    fn detail(&self) -> String {
        render::actor_detail(self)
    }
}

fn catalog<R>(
    app: &mut App,
    action: CatalogAction<R>,
    console: &mut Console<'_>,
) -> anyhow::Result<()>
where
    R: EditableResource + Tabular + Detail,
{
    let kind = R::KIND;
    let singular = kind.singular().to_lowercase();
    require_session(app, Route::list(kind))?;

    match action {
        CatalogAction::List => {
            let items = load_list::<R>(app, &mut ListPage::new())?;
            let text = render::records(&items, console.json)?;
            console.print(&text)
        }
        CatalogAction::Show(id) => {
            let item: R = app
                .api_mut()
                .get(&id)
                .map_err(|e| anyhow!("could not load {singular} {id}: {}", e.user_message()))?;
            if console.json {
                console.print(&serde_json::to_string_pretty(&item)?)
            } else {
                console.print(&item.detail())
            }
        }
        CatalogAction::Create(entries) => {
            app.navigate(Route::create(kind));
            let mut page = FormPage::<R>::new(FormMode::Create);
            save(app, &mut page, entries, &format!("could not create the {singular}"), console)
        }
        CatalogAction::Edit(id, entries) => {
            app.navigate(Route::edit(kind, &id));
            let mut page = FormPage::<R>::new(FormMode::Edit(id.clone()));
            match page.load(app) {
                QueryState::Ready(()) => {}
                QueryState::Failed(e) => {
                    return Err(reported(&format!("could not load {singular} {id}"), e))
                }
                QueryState::Loading => bail!("{singular} {id} is already loading"),
            }
            save(app, &mut page, entries, &format!("could not update the {singular}"), console)
        }
        CatalogAction::Delete { id, yes } => delete::<R>(app, &id, yes, console),
    }
}

fn load_list<R: EditableResource>(app: &mut App, page: &mut ListPage<R>) -> anyhow::Result<Vec<R>> {
    match page.render(app) {
        QueryState::Ready(items) => Ok(items),
        QueryState::Failed(e) => Err(reported(&format!("could not load {}", R::KIND), e)),
        QueryState::Loading => bail!("{} are already loading", R::KIND),
    }
}

fn save<R: EditableResource + Tabular + Detail>(
    app: &mut App,
    page: &mut FormPage<R>,
    entries: Vec<(FieldOf<R>, String)>,
    action: &str,
    console: &mut Console<'_>,
) -> anyhow::Result<()> {
    for (field, value) in entries {
        page.set(field, value);
    }
    let saved = page.submit(app).map_err(|e| reported(action, e))?;
    if console.json {
        console.print(&serde_json::to_string_pretty(&saved)?)
    } else {
        console.print(&saved.detail())
    }
}

fn delete<R: EditableResource>(
    app: &mut App,
    id: &str,
    yes: bool,
    console: &mut Console<'_>,
) -> anyhow::Result<()> {
    let singular = R::KIND.singular().to_lowercase();
    let mut page = ListPage::<R>::new();
    let item = load_list(app, &mut page)?
        .into_iter()
        .find(|item| item.id() == id)
        .ok_or_else(|| anyhow!("no {singular} with id {id}"))?;

    page.request_delete(item);
    let approved = match page.dialog().prompt() {
        Some(_) if yes => true,
        Some(prompt) => console.confirm(prompt)?,
        None => bail!("a delete is already in progress"),
    };
    if !approved {
        page.cancel_delete();
        return console.print("Cancelled");
    }

    match page.confirm_delete(app) {
        MutationState::Failed(e) => Err(reported(
            &format!("could not delete {singular} {id}"),
            e.clone(),
        )),
        _ => Ok(()),
    }
}
