use tracing::warn;

use tutor_core::{Data, Error};
use tutor_store::model::user::Role;
use tutor_utils::formatting::usage_message;

use crate::CommandMeta;

pub const META: CommandMeta = CommandMeta {
    name: "login",
    desc: "Store a bearer token and role for later calls.",
    usage: "tutor login <token> <role>",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let (Some(token), Some(raw_role)) = (args.first(), args.get(1)) else {
        return Ok(usage_message(META.usage));
    };
    if token.trim().is_empty() {
        return Ok(usage_message(META.usage));
    }

    let role = Role::parse(raw_role);
    if role == Role::Other {
        warn!(role = %raw_role, "unrecognised role stored as Other");
    }

    // Cached reads belong to whoever was signed in before.
    data.cache.clear();
    data.credentials.login(token, role)?;

    Ok(format!("Signed in as {}.", role.as_str()))
}
