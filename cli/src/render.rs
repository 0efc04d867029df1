//! Terminal output for records and toasts.

use std::io::{self, Write};

use catalog_core::{Actor, Film, Resource, Toast, ToastKind, User};

/// A record the CLI knows how to print.
pub trait Tabular: Resource {
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

impl Tabular for Film {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "YEAR", "RATING"];

    fn row(&self) -> Vec<String> {
        vec![
            self.film_id.clone(),
            self.title.clone(),
            self.release_year.map(|y| y.to_string()).unwrap_or_default(),
            self.rating.to_string(),
        ]
    }
}

impl Tabular for Actor {
    const HEADERS: &'static [&'static str] = &["ID", "FIRST NAME", "LAST NAME"];

    fn row(&self) -> Vec<String> {
        vec![
            self.actor_id.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
        ]
    }
}

/// Left-aligned columns sized to their widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = pad_line(headers.iter().copied(), &widths);
    for row in rows {
        out.push('\n');
        out.push_str(&pad_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}

pub fn records<R: Tabular>(items: &[R], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(items)?);
    }
    if items.is_empty() {
        return Ok(format!("No {} found", R::KIND));
    }
    let rows: Vec<Vec<String>> = items.iter().map(Tabular::row).collect();
    Ok(table(R::HEADERS, &rows))
}

pub fn film_detail(film: &Film) -> String {
    let fields = [
        ("ID", film.film_id.clone()),
        ("Title", film.title.clone()),
        ("Description", film.description.clone().unwrap_or_default()),
        ("Image path", film.image_path.clone().unwrap_or_default()),
        (
            "Release year",
            film.release_year.map(|y| y.to_string()).unwrap_or_default(),
        ),
        ("Rating", film.rating.to_string()),
        ("Last update", film.last_update.clone()),
    ];
    detail(&fields)
}

pub fn actor_detail(actor: &Actor) -> String {
    let fields = [
        ("ID", actor.actor_id.clone()),
        ("First name", actor.first_name.clone()),
        ("Last name", actor.last_name.clone()),
        ("Last update", actor.last_update.clone()),
    ];
    detail(&fields)
}

pub fn user_detail(user: &User) -> String {
    let fields = [
        ("Username", user.username.clone()),
        ("Name", user.name.clone().unwrap_or_default()),
        ("Email", user.email.clone().unwrap_or_default()),
        (
            "Email verified",
            user.email_verified
                .map(|v| if v { "yes" } else { "no" }.to_string())
                .unwrap_or_default(),
        ),
    ];
    detail(&fields)
}

fn detail(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    fields
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k:<width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn toast_line(toast: &Toast) -> String {
    let marker = match toast.kind {
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
        ToastKind::Info => "info",
        ToastKind::Warning => "warning",
    };
    format!("[{marker}] {}", toast.message)
}

/// Print drained toasts; errors and warnings go to stderr.
pub fn flush_toasts(toasts: Vec<Toast>) {
    let stdout = io::stdout();
    let stderr = io::stderr();
    for toast in &toasts {
        let line = toast_line(toast);
        // Broken pipes are ignored.
        let _ = match toast.kind {
            ToastKind::Error | ToastKind::Warning => writeln!(stderr.lock(), "{line}"),
            ToastKind::Success | ToastKind::Info => writeln!(stdout.lock(), "{line}"),
        };
    }
}
