pub mod activity;
pub mod profile;
pub mod utility;

#[cfg(test)]
pub(crate) mod testing;

use tutor_core::{Data, Error};
use tutor_utils::formatting::usage_message;

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::help::META,
    utility::login::META,
    utility::logout::META,
    profile::show::META,
    profile::picture::META,
    profile::ranks::META,
    activity::list::META,
    activity::show::META,
    activity::edit::META,
    activity::complete::META,
];

pub fn find_command(name: &str) -> Option<&'static CommandMeta> {
    COMMANDS.iter().find(|meta| meta.name == name)
}

/// Run the command `name` and return the text to print.
pub async fn dispatch(data: &Data, name: &str, args: &[String]) -> Result<String, Error> {
    match name {
        "help" => Ok(utility::help::run(args)),
        "login" => utility::login::run(data, args).await,
        "logout" => utility::logout::run(data).await,
        "profile" => profile::show::run(data, args).await,
        "avatar" => profile::picture::run(data, args).await,
        "leaderboard" => profile::ranks::run(data, args).await,
        "activities" => activity::list::run(data).await,
        "activity" => activity::show::run(data, args).await,
        "edit-activity" => activity::edit::run(data, args).await,
        "mark-done" => activity::complete::run(data, args).await,
        other => Ok(format!(
            "Unknown command `{}`.\n{}",
            other,
            usage_message(utility::help::META.usage)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{COMMANDS, find_command};

    #[test]
    fn command_names_are_unique() {
        for (idx, meta) in COMMANDS.iter().enumerate() {
            assert!(
                COMMANDS[idx + 1..].iter().all(|other| other.name != meta.name),
                "duplicate command `{}`",
                meta.name
            );
        }
    }

    #[test]
    fn usages_start_with_binary_and_name() {
        for meta in COMMANDS {
            assert!(meta.usage.starts_with(&format!("tutor {}", meta.name)));
        }
        assert!(find_command("profile").is_some());
        assert!(find_command("ban").is_none());
    }
}
