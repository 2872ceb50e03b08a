use tracing::info;

use tutor_core::{Data, Error};
use tutor_store::QueryKey;
use tutor_store::model::activity::FinalScore;
use tutor_utils::formatting::usage_message;

use crate::CommandMeta;

pub const META: CommandMeta = CommandMeta {
    name: "mark-done",
    desc: "Record a student's final score for an activity.",
    usage: "tutor mark-done <studentId> <activityId> <score>",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let [student_id, activity_id, score] = args else {
        return Ok(usage_message(META.usage));
    };
    let Ok(score) = score.trim().parse::<u32>() else {
        return Ok(format!("Invalid score `{}`.\n{}", score, usage_message(META.usage)));
    };

    data.activities
        .send_final_score(FinalScore {
            student_id: student_id.clone(),
            activity_id: activity_id.clone(),
            score,
        })
        .await?;
    info!(student_id = %student_id, activity_id = %activity_id, score, "final score recorded");

    // Points and completions changed server-side.
    data.cache.invalidate(&QueryKey::user(student_id));
    data.cache.invalidate(&QueryKey::leaderboard());
    data.cache.invalidate(&QueryKey::activity(activity_id));

    Ok(format!("Recorded score {} for `{}`.", score, student_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::run;
    use crate::testing::{FakeApi, data};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[tokio::test]
    async fn sends_score_payload() {
        let api = Arc::new(FakeApi::default());
        let out = run(&data(&api, None), &args(&["u1", "a1", "90"]))
            .await
            .unwrap();

        assert_eq!(out, "Recorded score 90 for `u1`.");
        let scores = api.scores.lock().unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].activity_id, "a1");
        assert_eq!(scores[0].score, 90);
    }

    #[tokio::test]
    async fn bad_score_is_not_sent() {
        let api = Arc::new(FakeApi::default());
        let out = run(&data(&api, None), &args(&["u1", "a1", "lots"]))
            .await
            .unwrap();

        assert!(out.starts_with("Invalid score `lots`."));
        assert!(api.scores.lock().unwrap().is_empty());
    }
}
