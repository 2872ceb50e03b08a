use anyhow::Context as _;
use serde_json::Value;
use tracing::info;

use tutor_core::{Data, Error};
use tutor_store::QueryKey;
use tutor_utils::formatting::usage_message;

use crate::CommandMeta;

pub const META: CommandMeta = CommandMeta {
    name: "edit-activity",
    desc: "Patch an activity with a JSON object.",
    usage: "tutor edit-activity <activityId> <json>",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let (Some(activity_id), Some(raw)) = (args.first(), args.get(1)) else {
        return Ok(usage_message(META.usage));
    };

    let patch: Value = serde_json::from_str(raw).context("activity patch is not valid JSON")?;
    if !patch.is_object() {
        return Ok("Activity patch must be a JSON object.".to_owned());
    }

    data.activities.update_activity(activity_id, patch).await?;
    info!(activity_id = %activity_id, "activity updated");

    data.cache.invalidate(&QueryKey::activity(activity_id));
    data.cache.invalidate(&QueryKey::activities());

    Ok(format!("Activity `{}` updated.", activity_id))
}
