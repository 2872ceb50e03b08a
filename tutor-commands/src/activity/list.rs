use std::fmt::Write as _;
use std::sync::Arc;

use tutor_core::{Data, Error};
use tutor_store::QueryKey;
use tutor_store::model::activity::Activity;
use tutor_utils::MISSING_FIELD;

use crate::CommandMeta;
use crate::activity::activities_fetcher;

pub const META: CommandMeta = CommandMeta {
    name: "activities",
    desc: "List available activities.",
    usage: "tutor activities",
};

pub async fn run(data: &Data) -> Result<String, Error> {
    let activities = data
        .cache
        .fetch::<Vec<Activity>>(
            &QueryKey::activities(),
            activities_fetcher(Arc::clone(&data.activities)),
        )
        .await?;

    if activities.is_empty() {
        return Ok("No activities found.".to_owned());
    }

    let mut out = String::new();
    for activity in &activities {
        let _ = writeln!(
            out,
            "{:<12} {}",
            activity.id,
            activity.title().unwrap_or(MISSING_FIELD)
        );
    }
    Ok(out.trim_end().to_owned())
}
