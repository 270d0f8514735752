pub mod config;
pub mod logger;

use validator::ValidationErrors;

/// Joins every field message of a failed `validator` run into one line.
///
/// Fields are visited in name order so the message is stable between runs.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field} is invalid ({})", e.code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Returns the name of the first failing field, if any.
pub fn first_invalid_field(errors: &ValidationErrors) -> Option<String> {
    let mut names: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|k| k.to_string())
        .collect();
    names.sort();
    names.into_iter().next()
}
