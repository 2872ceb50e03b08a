use tutor_store::model::user::User;

use crate::MISSING_FIELD;

/// Value of an optional text field, or the `---` placeholder.
pub fn or_missing(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(MISSING_FIELD)
}

/// "First Last", skipping whichever part is blank.
pub fn display_name(user: &User) -> String {
    [Some(user.first_name.as_str()), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rank label; 0 means the user is not on the leaderboard.
pub fn format_rank(rank: usize) -> String {
    if rank == 0 {
        MISSING_FIELD.to_owned()
    } else {
        format!("#{}", rank)
    }
}

/// Group thousands with commas: 12500 -> "12,500".
pub fn format_points(points: u64) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Usage hint shown when a command is invoked with missing arguments.
pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{}`", usage)
}
