use std::fmt::Write as _;
use std::sync::Arc;

use tutor_core::{Data, Error};
use tutor_store::QueryKey;
use tutor_store::model::user::User;
use tutor_utils::formatting::{display_name, format_points};

use crate::CommandMeta;
use crate::profile::controller::users_fetcher;
use crate::profile::leaderboard::rank_students;

pub const META: CommandMeta = CommandMeta {
    name: "leaderboard",
    desc: "List students by experience points.",
    usage: "tutor leaderboard [userId]",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let highlight = args.first().map(String::as_str);
    let users = data
        .cache
        .fetch::<Vec<User>>(&QueryKey::leaderboard(), users_fetcher(Arc::clone(&data.users)))
        .await?;

    let students = rank_students(&users);
    if students.is_empty() {
        return Ok("No students on the leaderboard yet.".to_owned());
    }

    let mut out = String::new();
    for (idx, student) in students.iter().enumerate() {
        let marker = if highlight == Some(student.id.as_str()) { "*" } else { " " };
        let name = match display_name(student) {
            name if name.is_empty() => student.username.clone(),
            name => name,
        };
        let _ = writeln!(
            out,
            "{}#{:<3} {:<24} {} pts",
            marker,
            idx + 1,
            name,
            format_points(student.exp_points)
        );
    }

    Ok(out.trim_end().to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tutor_store::model::user::Role;

    use super::run;
    use crate::testing::{FakeApi, data, scenario_users};

    #[tokio::test]
    async fn lists_students_highest_first() {
        let api = Arc::new(FakeApi::with_users(scenario_users()));
        let out = run(&data(&api, Some(Role::Student)), &["u1".to_owned()])
            .await
            .unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(" #1") && lines[0].contains("u2"));
        assert!(lines[1].starts_with("*#2") && lines[1].contains("u1"));
        assert!(lines[2].contains("u3"));
    }

    #[tokio::test]
    async fn empty_leaderboard_is_reported() {
        let api = Arc::new(FakeApi::default());
        let out = run(&data(&api, None), &[]).await.unwrap();
        assert_eq!(out, "No students on the leaderboard yet.");
    }
}
