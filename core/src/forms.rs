//! Rule tables for every form in the client.

use crate::error::FieldErrors;
use crate::form::{FormField, FormSchema, FormValues, Rule};
use crate::resource::Resource;
use crate::types::{
    Actor, ConfirmForgotPasswordRequest, ConfirmSignUpRequest, CreateActor, CreateFilm, Film,
    LoginRequest, Rating, UpdateActor, UpdateFilm,
};

pub const RELEASE_YEAR_MIN: i64 = 1800;
pub const RELEASE_YEAR_MAX: i64 = 2100;

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const NEW_PASSWORD_MIN_LEN: usize = 8;

macro_rules! form_fields {
    ($name:ident { $($variant:ident => ($field:literal, $label:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl FormField for $name {
            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $field),+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

/// A resource that has a create/edit form.
pub trait EditableResource: Resource {
    type Form: FormSchema;

    /// Draft values for editing an existing record.
    fn seed(&self) -> Vec<(<Self::Form as FormSchema>::Field, String)>;

    fn create_input(output: <Self::Form as FormSchema>::Output) -> Self::Create;

    fn update_input(output: <Self::Form as FormSchema>::Output) -> Self::Update;
}

// ---------------------------------------------------------------------------
// Films
// ---------------------------------------------------------------------------

form_fields!(FilmField {
    Title => ("title", "Title"),
    Description => ("description", "Description"),
    ImagePath => ("image_path", "Image path"),
    ReleaseYear => ("release_year", "Release year"),
    Rating => ("rating", "Rating"),
});

pub struct FilmForm;

impl FormSchema for FilmForm {
    type Field = FilmField;
    type Output = CreateFilm;

    const RULES: &'static [(FilmField, &'static [Rule<FilmField>])] = &[
        (FilmField::Title, &[Rule::Required]),
        (FilmField::Rating, &[Rule::Required, Rule::OneOf(&Rating::LABELS)]),
        (
            FilmField::ReleaseYear,
            &[Rule::IntRange {
                min: RELEASE_YEAR_MIN,
                max: RELEASE_YEAR_MAX,
            }],
        ),
    ];

    fn defaults() -> Vec<(FilmField, String)> {
        vec![(FilmField::Rating, Rating::G.to_string())]
    }

    fn build(values: &FormValues<FilmField>) -> Result<CreateFilm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let rating = values
            .trimmed(FilmField::Rating)
            .parse::<Rating>()
            .map_err(|e| errors.insert(FilmField::Rating.name(), e.to_string()))
            .ok();
        let release_year = match values.optional(FilmField::ReleaseYear) {
            Some(year) => year
                .parse::<i32>()
                .map_err(|_| {
                    errors.insert(FilmField::ReleaseYear.name(), "Release year must be a whole number")
                })
                .ok(),
            None => None,
        };
        match rating {
            Some(rating) if errors.is_empty() => Ok(CreateFilm {
                title: values.trimmed(FilmField::Title),
                rating,
                description: values.optional(FilmField::Description),
                image_path: values.optional(FilmField::ImagePath),
                release_year,
            }),
            _ => Err(errors),
        }
    }
}

impl EditableResource for Film {
    type Form = FilmForm;

    fn seed(&self) -> Vec<(FilmField, String)> {
        vec![
            (FilmField::Title, self.title.clone()),
            (FilmField::Description, self.description.clone().unwrap_or_default()),
            (FilmField::ImagePath, self.image_path.clone().unwrap_or_default()),
            (
                FilmField::ReleaseYear,
                self.release_year.map(|y| y.to_string()).unwrap_or_default(),
            ),
            (FilmField::Rating, self.rating.to_string()),
        ]
    }

    fn create_input(output: CreateFilm) -> CreateFilm {
        output
    }

    fn update_input(output: CreateFilm) -> UpdateFilm {
        output.into()
    }
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

form_fields!(ActorField {
    FirstName => ("first_name", "First name"),
    LastName => ("last_name", "Last name"),
});

pub struct ActorForm;

impl FormSchema for ActorForm {
    type Field = ActorField;
    type Output = CreateActor;

    const RULES: &'static [(ActorField, &'static [Rule<ActorField>])] = &[
        (ActorField::FirstName, &[Rule::Required]),
        (ActorField::LastName, &[Rule::Required]),
    ];

    fn build(values: &FormValues<ActorField>) -> Result<CreateActor, FieldErrors> {
        Ok(CreateActor {
            first_name: values.trimmed(ActorField::FirstName),
            last_name: values.trimmed(ActorField::LastName),
        })
    }
}

impl EditableResource for Actor {
    type Form = ActorForm;

    fn seed(&self) -> Vec<(ActorField, String)> {
        vec![
            (ActorField::FirstName, self.first_name.clone()),
            (ActorField::LastName, self.last_name.clone()),
        ]
    }

    fn create_input(output: CreateActor) -> CreateActor {
        output
    }

    fn update_input(output: CreateActor) -> UpdateActor {
        output.into()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

form_fields!(LoginField {
    Username => ("username", "Username"),
    Password => ("password", "Password"),
});

pub struct LoginForm;

impl FormSchema for LoginForm {
    type Field = LoginField;
    type Output = LoginRequest;

    const RULES: &'static [(LoginField, &'static [Rule<LoginField>])] = &[
        (LoginField::Username, &[Rule::Required, Rule::MinLength(USERNAME_MIN_LEN)]),
        (LoginField::Password, &[Rule::Required, Rule::MinLength(PASSWORD_MIN_LEN)]),
    ];

    fn build(values: &FormValues<LoginField>) -> Result<LoginRequest, FieldErrors> {
        Ok(LoginRequest {
            username: values.trimmed(LoginField::Username),
            // Passwords are sent as typed.
            password: values.get(LoginField::Password).to_string(),
        })
    }
}

form_fields!(ConfirmSignUpField {
    Username => ("username", "Username"),
    Code => ("confirmation_code", "Confirmation code"),
});

pub struct ConfirmSignUpForm;

impl FormSchema for ConfirmSignUpForm {
    type Field = ConfirmSignUpField;
    type Output = ConfirmSignUpRequest;

    const RULES: &'static [(ConfirmSignUpField, &'static [Rule<ConfirmSignUpField>])] = &[
        (ConfirmSignUpField::Username, &[Rule::Required]),
        (ConfirmSignUpField::Code, &[Rule::Required]),
    ];

    fn build(values: &FormValues<ConfirmSignUpField>) -> Result<ConfirmSignUpRequest, FieldErrors> {
        Ok(ConfirmSignUpRequest {
            username: values.trimmed(ConfirmSignUpField::Username),
            confirmation_code: values.trimmed(ConfirmSignUpField::Code),
        })
    }
}

form_fields!(ForgotPasswordField {
    Username => ("username", "Username"),
});

pub struct ForgotPasswordForm;

impl FormSchema for ForgotPasswordForm {
    type Field = ForgotPasswordField;
    type Output = String;

    const RULES: &'static [(ForgotPasswordField, &'static [Rule<ForgotPasswordField>])] =
        &[(ForgotPasswordField::Username, &[Rule::Required])];

    fn build(values: &FormValues<ForgotPasswordField>) -> Result<String, FieldErrors> {
        Ok(values.trimmed(ForgotPasswordField::Username))
    }
}

form_fields!(ResetPasswordField {
    Username => ("username", "Username"),
    Code => ("confirmation_code", "Confirmation code"),
    NewPassword => ("new_password", "New password"),
    ConfirmPassword => ("confirm_password", "Confirm password"),
});

pub struct ResetPasswordForm;

impl FormSchema for ResetPasswordForm {
    type Field = ResetPasswordField;
    type Output = ConfirmForgotPasswordRequest;

    const RULES: &'static [(ResetPasswordField, &'static [Rule<ResetPasswordField>])] = &[
        (ResetPasswordField::Username, &[Rule::Required]),
        (ResetPasswordField::Code, &[Rule::Required]),
        (
            ResetPasswordField::NewPassword,
            &[Rule::Required, Rule::MinLength(NEW_PASSWORD_MIN_LEN)],
        ),
        (
            ResetPasswordField::ConfirmPassword,
            &[Rule::Required, Rule::Matches(ResetPasswordField::NewPassword)],
        ),
    ];

    fn build(
        values: &FormValues<ResetPasswordField>,
    ) -> Result<ConfirmForgotPasswordRequest, FieldErrors> {
        Ok(ConfirmForgotPasswordRequest {
            username: values.trimmed(ResetPasswordField::Username),
            confirmation_code: values.trimmed(ResetPasswordField::Code),
            new_password: values.get(ResetPasswordField::NewPassword).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::form::FormDraft;

    fn film_draft(title: &str, year: &str) -> FormDraft<FilmForm> {
        let mut draft = FormDraft::<FilmForm>::new();
        draft.set(FilmField::Title, title);
        draft.set(FilmField::ReleaseYear, year);
        draft
    }

    #[test]
    fn release_year_bounds_are_inclusive() {
        for year in ["1800", "2100", ""] {
            assert!(film_draft("Inception", year).validate(), "{year} should pass");
        }
        for year in ["1799", "2101"] {
            let mut draft = film_draft("Inception", year);
            assert!(!draft.validate());
            assert_eq!(
                draft.error(FilmField::ReleaseYear),
                Some("Release year must be between 1800 and 2100")
            );
        }
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        let mut draft = film_draft("Inception", "twenty");
        assert!(!draft.validate());
        assert_eq!(draft.error(FilmField::ReleaseYear), Some("Release year must be a whole number"));
    }

    #[test]
    fn blank_title_is_required() {
        let mut draft = film_draft("   ", "");
        let err = draft.begin_submit().unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors.get("title"), Some("Title is required")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!draft.is_submitting());
    }

    #[test]
    fn editing_a_field_clears_only_its_error() {
        let mut draft = FormDraft::<FilmForm>::new();
        draft.set(FilmField::ReleaseYear, "3000");
        assert!(!draft.validate());
        assert!(draft.error(FilmField::Title).is_some());
        assert!(draft.error(FilmField::ReleaseYear).is_some());

        draft.set(FilmField::Title, "Heat");
        assert_eq!(draft.error(FilmField::Title), None);
        assert!(draft.error(FilmField::ReleaseYear).is_some());
    }

    #[test]
    fn rating_defaults_to_g_and_rejects_unknown() {
        let mut draft = film_draft("Heat", "");
        assert_eq!(draft.value(FilmField::Rating), "G");

        draft.set(FilmField::Rating, "X");
        assert!(!draft.validate());
        assert_eq!(
            draft.error(FilmField::Rating),
            Some("Rating must be one of G, PG, PG-13, R, NC-17")
        );
    }

    #[test]
    fn film_payload_drops_blank_optionals() {
        let mut draft = film_draft("  Heat ", "1995");
        draft.set(FilmField::Rating, "R");
        draft.set(FilmField::Description, "   ");
        let payload = draft.begin_submit().unwrap();
        assert_eq!(
            payload,
            CreateFilm {
                title: "Heat".to_string(),
                rating: Rating::R,
                description: None,
                image_path: None,
                release_year: Some(1995),
            }
        );
        assert!(draft.is_submitting());
    }

    #[test]
    fn second_submit_is_refused_while_pending() {
        let mut draft = film_draft("Heat", "");
        draft.begin_submit().unwrap();
        assert_eq!(draft.begin_submit().unwrap_err().error_code(), "REQUEST_ERROR");
        draft.finish_submit();
        assert!(draft.begin_submit().is_ok());
    }

    #[test]
    fn edit_draft_is_seeded_from_film() {
        let film = Film {
            film_id: "f1".to_string(),
            title: "Inception".to_string(),
            description: None,
            image_path: None,
            release_year: Some(2010),
            rating: Rating::Pg13,
            last_update: String::new(),
            delete_flag: false,
        };
        let draft = FormDraft::<FilmForm>::with_values(film.seed());
        assert_eq!(draft.value(FilmField::Title), "Inception");
        assert_eq!(draft.value(FilmField::ReleaseYear), "2010");
        assert_eq!(draft.value(FilmField::Rating), "PG-13");
        assert_eq!(draft.value(FilmField::Description), "");
    }

    #[test]
    fn login_enforces_minimum_lengths() {
        let mut draft = FormDraft::<LoginForm>::new();
        draft.set(LoginField::Username, "ab");
        draft.set(LoginField::Password, "12345");
        assert!(!draft.validate());
        assert_eq!(
            draft.error(LoginField::Username),
            Some("Username must be at least 3 characters")
        );
        assert_eq!(
            draft.error(LoginField::Password),
            Some("Password must be at least 6 characters")
        );

        draft.set(LoginField::Username, "abc");
        draft.set(LoginField::Password, "123456");
        assert!(draft.validate());
    }

    #[test]
    fn actor_names_are_required() {
        let mut draft = FormDraft::<ActorForm>::new();
        draft.set(ActorField::FirstName, "Penelope");
        assert!(!draft.validate());
        assert_eq!(draft.error(ActorField::LastName), Some("Last name is required"));
        assert_eq!(draft.field_errors().len(), 1);
    }

    #[test]
    fn reset_password_requires_matching_confirmation() {
        let mut draft = FormDraft::<ResetPasswordForm>::new();
        draft.set(ResetPasswordField::Username, "alice");
        draft.set(ResetPasswordField::Code, "123456");
        draft.set(ResetPasswordField::NewPassword, "longenough");
        draft.set(ResetPasswordField::ConfirmPassword, "longenougH");
        assert!(!draft.validate());
        assert_eq!(
            draft.error(ResetPasswordField::ConfirmPassword),
            Some("Confirm password must match new password")
        );

        draft.set(ResetPasswordField::ConfirmPassword, "longenough");
        let request = draft.begin_submit().unwrap();
        assert_eq!(request.new_password, "longenough");
    }

    #[test]
    fn reset_password_minimum_is_eight() {
        let mut draft = FormDraft::<ResetPasswordForm>::new();
        draft.set(ResetPasswordField::NewPassword, "short12");
        draft.validate();
        assert_eq!(
            draft.error(ResetPasswordField::NewPassword),
            Some("New password must be at least 8 characters")
        );
    }
}
