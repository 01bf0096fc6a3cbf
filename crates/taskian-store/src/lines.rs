//! Plain delimited-line task format.
//!
//! One task per line: `description|YYYY-MM-DD|repeat|subtask;subtask [Done]`.
//! Everything after the description is optional. Blank lines and lines
//! starting with `#` are skipped.

use taskian_core::{Recurrence, Subtask, SubtaskList, Task};
use time::Date;
use time::macros::format_description;

use crate::error::{Result, StoreError};

const DONE_MARKER: &str = " [Done]";

/// Decode every task in `input`. Tasks without a date fall due on `default_due`.
///
/// # Errors
/// Returns [`StoreError::MalformedLine`] for the first line that cannot be
/// decoded.
pub fn parse(input: &str, default_due: Date) -> Result<Vec<Task>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            parse_line(line, default_due).map_err(|reason| StoreError::MalformedLine {
                line: idx + 1,
                reason,
            })
        })
        .collect()
}

fn parse_line(line: &str, default_due: Date) -> std::result::Result<Task, String> {
    let mut fields = line.split('|');
    let description = fields.next().unwrap_or_default().trim();
    if description.is_empty() {
        return Err("missing description".to_owned());
    }

    let due = match fields.next().map(str::trim).filter(|field| !field.is_empty()) {
        Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map_err(|err| format!("bad date '{raw}': {err}"))?,
        None => default_due,
    };
    let recurrence = fields
        .next()
        .unwrap_or_default()
        .parse::<Recurrence>()
        .map_err(|err| err.to_string())?;
    let subtasks = fields.next().map(parse_subtasks).unwrap_or_default();

    if fields.next().is_some() {
        return Err("too many fields".to_owned());
    }

    let mut task = Task::new(description, due, recurrence);
    task.subtasks = subtasks;
    Ok(task)
}

fn parse_subtasks(field: &str) -> SubtaskList {
    let items = field
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.strip_suffix(DONE_MARKER.trim_start()) {
            Some(rest) => Subtask {
                description: rest.trim_end().to_owned(),
                done: true,
            },
            None => Subtask::new(item),
        })
        .collect();
    SubtaskList::from_items(items)
}

/// Encode tasks, one per line, in the order given.
///
/// # Errors
/// Returns [`StoreError::Unencodable`] when a text contains a delimiter, a
/// description starts with `#`, or an open subtask ends in `[Done]`.
pub fn format(tasks: &[Task]) -> Result<String> {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&format_line(task)?);
        out.push('\n');
    }
    Ok(out)
}

fn format_line(task: &Task) -> Result<String> {
    ensure_encodable(&task.description)?;
    if task.description.trim_start().starts_with('#') {
        return Err(StoreError::Unencodable(task.description.clone()));
    }
    let due = task
        .due
        .format(format_description!("[year]-[month]-[day]"))
        .map_err(|_| StoreError::Unencodable(task.description.clone()))?;
    let repeat = match &task.recurrence {
        Recurrence::None => String::new(),
        rule => rule.to_string(),
    };

    let mut subtasks = Vec::with_capacity(task.subtasks.len());
    for item in &task.subtasks {
        ensure_encodable(&item.description)?;
        if !item.done && item.description.trim_end().ends_with(DONE_MARKER.trim_start()) {
            return Err(StoreError::Unencodable(item.description.clone()));
        }
        if item.done {
            subtasks.push(format!("{}{DONE_MARKER}", item.description));
        } else {
            subtasks.push(item.description.clone());
        }
    }

    let mut line = format!("{}|{due}|{repeat}", task.description);
    if !subtasks.is_empty() {
        line.push('|');
        line.push_str(&subtasks.join(";"));
    }
    Ok(line)
}

fn ensure_encodable(text: &str) -> Result<()> {
    if text.contains(['|', ';', '\n']) {
        return Err(StoreError::Unencodable(text.to_owned()));
    }
    Ok(())
}
