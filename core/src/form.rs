//! Generic form state with table-driven validation.
//!
//! A `FormSchema` names its fields, lists the rules per field, and turns
//! validated values into a request payload. `FormDraft` holds the values the
//! user typed, the field-keyed error map and the submitting flag; it is the
//! same state machine for every form.
//!
//! Rules for a field run in order and stop at the first failure. Every rule
//! except `Required` treats a blank value as "not provided" and passes.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{ApiError, FieldErrors};

pub trait FormField: Copy + Ord + fmt::Debug + 'static {
    /// Wire/field name used as the error-map key.
    fn name(self) -> &'static str;
    /// Human label used in messages.
    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule<F: 'static> {
    /// Non-empty after trimming.
    Required,
    /// At least this many characters, not counting surrounding whitespace.
    MinLength(usize),
    /// Exactly one of the listed values.
    OneOf(&'static [&'static str]),
    /// Integer within `[min, max]`.
    IntRange { min: i64, max: i64 },
    /// Equal to the value of another field.
    Matches(F),
}

impl<F: FormField> Rule<F> {
    fn check(&self, field: F, value: &str, values: &FormValues<F>) -> Option<String> {
        let label = field.label();
        if value.trim().is_empty() {
            return match self {
                Rule::Required => Some(format!("{label} is required")),
                _ => None,
            };
        }
        match self {
            Rule::Required => None,
            Rule::MinLength(min) if value.trim().chars().count() < *min => {
                Some(format!("{label} must be at least {min} characters"))
            }
            Rule::MinLength(_) => None,
            Rule::OneOf(allowed) if !allowed.contains(&value.trim()) => {
                Some(format!("{label} must be one of {}", allowed.join(", ")))
            }
            Rule::OneOf(_) => None,
            Rule::IntRange { min, max } => match value.trim().parse::<i64>() {
                Ok(n) if n < *min || n > *max => {
                    Some(format!("{label} must be between {min} and {max}"))
                }
                Ok(_) => None,
                Err(_) => Some(format!("{label} must be a whole number")),
            },
            Rule::Matches(other) if values.get(*other) != value => {
                Some(format!("{label} must match {}", other.label().to_lowercase()))
            }
            Rule::Matches(_) => None,
        }
    }
}

/// Field values as typed. Missing fields read as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues<F: FormField>(BTreeMap<F, String>);

impl<F: FormField> Default for FormValues<F> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<F: FormField> FormValues<F> {
    pub fn get(&self, field: F) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Trimmed value, or `None` when blank.
    pub fn optional(&self, field: F) -> Option<String> {
        let value = self.get(field).trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Trimmed value, blank allowed.
    pub fn trimmed(&self, field: F) -> String {
        self.get(field).trim().to_string()
    }

    pub fn set(&mut self, field: F, value: String) {
        self.0.insert(field, value);
    }
}

pub trait FormSchema {
    type Field: FormField;
    type Output;

    const RULES: &'static [(Self::Field, &'static [Rule<Self::Field>])];

    /// Starting values for a create form.
    fn defaults() -> Vec<(Self::Field, String)> {
        Vec::new()
    }

    /// Convert validated values into the request payload.
    fn build(values: &FormValues<Self::Field>) -> Result<Self::Output, FieldErrors>;
}

/// Unsaved values and errors for one form instance.
pub struct FormDraft<S: FormSchema> {
    values: FormValues<S::Field>,
    errors: BTreeMap<S::Field, String>,
    submitting: bool,
    schema: PhantomData<S>,
}

impl<S: FormSchema> fmt::Debug for FormDraft<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormDraft")
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("submitting", &self.submitting)
            .finish()
    }
}

impl<S: FormSchema> Default for FormDraft<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FormSchema> FormDraft<S> {
    pub fn new() -> Self {
        Self::with_values(Vec::new())
    }

    /// Schema defaults overlaid with `values` (edit pages seed from the
    /// fetched entity this way).
    pub fn with_values(values: impl IntoIterator<Item = (S::Field, String)>) -> Self {
        let mut draft = Self {
            values: FormValues::default(),
            errors: BTreeMap::new(),
            submitting: false,
            schema: PhantomData,
        };
        draft.reset(values);
        draft
    }

    pub fn reset(&mut self, values: impl IntoIterator<Item = (S::Field, String)>) {
        self.values = FormValues::default();
        for (field, value) in S::defaults().into_iter().chain(values) {
            self.values.set(field, value);
        }
        self.errors.clear();
        self.submitting = false;
    }

    /// Record an edit; clears that field's error.
    pub fn set(&mut self, field: S::Field, value: impl Into<String>) {
        self.values.set(field, value.into());
        self.errors.remove(&field);
    }

    pub fn value(&self, field: S::Field) -> &str {
        self.values.get(field)
    }

    pub fn values(&self) -> &FormValues<S::Field> {
        &self.values
    }

    pub fn error(&self, field: S::Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, message) in &self.errors {
            errors.insert(field.name(), message.clone());
        }
        errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Run every rule, replacing the error map. Returns whether the form is
    /// valid.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        for (field, rules) in S::RULES {
            let value = self.values.get(*field);
            if let Some(message) = rules
                .iter()
                .find_map(|rule| rule.check(*field, value, &self.values))
            {
                self.errors.insert(*field, message);
            }
        }
        self.errors.is_empty()
    }

    /// Start a submit: validate and build the payload, then mark the form as
    /// submitting until `finish_submit`. Fails without side effects beyond
    /// the error map when invalid, and refuses while a submit is pending.
    pub fn begin_submit(&mut self) -> Result<S::Output, ApiError> {
        if self.submitting {
            return Err(ApiError::Request(
                "a submission is already in progress".to_string(),
            ));
        }
        if !self.validate() {
            return Err(ApiError::Validation(self.field_errors()));
        }
        let output = S::build(&self.values).map_err(|errors| {
            for (name, message) in errors.iter() {
                if let Some((field, _)) = S::RULES.iter().find(|(f, _)| f.name() == name) {
                    self.errors.insert(*field, message.to_string());
                }
            }
            ApiError::Validation(errors)
        })?;
        self.submitting = true;
        Ok(output)
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }
}
