use std::sync::Arc;

use anyhow::Context as _;

use tutor_core::{Data, Error};
use tutor_store::QueryKey;
use tutor_store::model::activity::Activity;
use tutor_utils::formatting::usage_message;

use crate::CommandMeta;
use crate::activity::activity_fetcher;

pub const META: CommandMeta = CommandMeta {
    name: "activity",
    desc: "Show one activity.",
    usage: "tutor activity <activityId>",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let Some(activity_id) = args.first() else {
        return Ok(usage_message(META.usage));
    };

    let activity = data
        .cache
        .fetch::<Activity>(
            &QueryKey::activity(activity_id),
            activity_fetcher(Arc::clone(&data.activities), activity_id.clone()),
        )
        .await?;

    serde_json::to_string_pretty(&activity).context("failed to render activity")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::run;
    use crate::testing::{FakeApi, activity, data};

    #[tokio::test]
    async fn renders_activity_as_json() {
        let api = Arc::new(FakeApi {
            activities: vec![activity("a1", "Fractions")],
            ..FakeApi::default()
        });

        let out = run(&data(&api, None), &["a1".to_owned()]).await.unwrap();
        assert!(out.contains("\"title\": \"Fractions\""));
    }

    #[tokio::test]
    async fn unknown_activity_is_an_error() {
        let api = Arc::new(FakeApi::default());
        let err = run(&data(&api, None), &["zz".to_owned()]).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
