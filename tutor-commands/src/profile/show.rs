use std::fmt::Write as _;

use tracing::{info, warn};

use tutor_core::{Data, Error};
use tutor_store::model::user::User;
use tutor_utils::assets::NOT_FOUND_ANIMATION;
use tutor_utils::formatting::{
    display_name, format_points, format_rank, or_missing, usage_message,
};

use crate::CommandMeta;
use crate::profile::{LeaderboardState, ProfileController, ProfilePhase};

pub const META: CommandMeta = CommandMeta {
    name: "profile",
    desc: "Show a user's profile, points and rank.",
    usage: "tutor profile <userId>",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let Some(user_id) = args.first() else {
        return Ok(usage_message(META.usage));
    };

    let (mut view, _notifications) =
        ProfileController::mount(data.clone(), Some(user_id.as_str()))?;
    if let Err(e) = view.load_profile().await {
        warn!(?e, user_id = %user_id, "profile load failed");
    }
    // One manual retry for transient failures; a missing user stays missing.
    if matches!(view.phase(), ProfilePhase::Failed(_)) && view.refresh() {
        info!(user_id = %user_id, "retrying profile load");
        if let Err(e) = view.load_profile().await {
            warn!(?e, user_id = %user_id, "profile retry failed");
        }
    }
    if let Err(e) = view.load_leaderboard().await {
        warn!(?e, user_id = %user_id, "leaderboard load failed");
    }

    Ok(render_profile(&view))
}

/// Text rendering of a mounted profile view.
pub fn render_profile(view: &ProfileController) -> String {
    let user = match view.phase() {
        ProfilePhase::Empty => return "No profile selected.".to_owned(),
        ProfilePhase::Loading => return "Loading profile...".to_owned(),
        ProfilePhase::NotFound => {
            return format!("Failed to load profile. [{}]", NOT_FOUND_ANIMATION);
        }
        ProfilePhase::Failed(reason) => {
            return format!("Failed to load profile. [{}]\n{}", NOT_FOUND_ANIMATION, reason);
        }
        ProfilePhase::Ready(user) => user,
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", display_name(&user));
    let _ = writeln!(out, "{}", user.username);
    if let Some(avatar) = view.avatar() {
        let _ = writeln!(out, "Picture: {}", avatar.location());
    }

    if view.shows_student_sections() {
        let _ = writeln!(out, "Total Points: {}", format_points(user.exp_points));
        let rank = match view.leaderboard() {
            LeaderboardState::Ready(standing) => format_rank(standing.rank),
            LeaderboardState::Loading | LeaderboardState::Disabled => "Loading rank...".to_owned(),
            LeaderboardState::Failed(_) => format_rank(0),
        };
        let _ = writeln!(out, "Rank: {}", rank);

        let _ = writeln!(out, "\nProgress");
        let _ = writeln!(out, "  Lessons Taken: {}", user.lessons_taken());
        let _ = writeln!(out, "  Activities Completed: {}", user.activities_completed());
    }

    let _ = writeln!(out, "\nPersonal Information");
    for (label, value) in personal_rows(&user) {
        let _ = writeln!(out, "  {}: {}", label, value);
    }

    out.trim_end().to_owned()
}

fn personal_rows(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("First Name", or_missing(Some(user.first_name.as_str())).to_owned()),
        ("Middle Name", or_missing(user.middle_name.as_deref()).to_owned()),
        ("Last Name", or_missing(user.last_name.as_deref()).to_owned()),
        ("Username", or_missing(Some(user.username.as_str())).to_owned()),
        ("Role", user.role.as_str().to_owned()),
        (
            "Age",
            user.age
                .map_or_else(|| or_missing(None).to_owned(), |age| age.to_string()),
        ),
        (
            "Gender",
            or_missing(user.gender.map(|gender| gender.as_str())).to_owned(),
        ),
        ("Address", or_missing(user.address.as_deref()).to_owned()),
        ("Email", or_missing(user.email.as_deref()).to_owned()),
        ("Unique ID", or_missing(user.unique_id.as_deref()).to_owned()),
        (
            "Teacher Name",
            or_missing(user.teacher.as_ref().map(|teacher| teacher.first_name.as_str()))
                .to_owned(),
        ),
    ]
}
