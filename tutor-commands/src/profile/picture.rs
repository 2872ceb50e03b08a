use std::fmt::Write as _;

use anyhow::Context as _;
use tracing::warn;

use tutor_api::ImageFile;
use tutor_core::{Data, Error};
use tutor_utils::formatting::usage_message;

use crate::CommandMeta;
use crate::profile::ProfileController;
use crate::profile::upload::UploadStatus;

pub const META: CommandMeta = CommandMeta {
    name: "avatar",
    desc: "Upload a new profile picture.",
    usage: "tutor avatar <userId> <imagePath>",
};

pub async fn run(data: &Data, args: &[String]) -> Result<String, Error> {
    let (Some(user_id), Some(path)) = (args.first(), args.get(1)) else {
        return Ok(usage_message(META.usage));
    };

    let file = ImageFile::from_path(path)
        .await
        .with_context(|| format!("failed to open `{}`", path))?;
    if !file.is_image() {
        return Ok(format!("`{}` does not look like an image.", path));
    }

    let (mut view, mut notifications) =
        ProfileController::mount(data.clone(), Some(user_id.as_str()))?;
    if let Err(e) = view.load_profile().await {
        warn!(?e, user_id = %user_id, "profile load failed before upload");
    }

    let Some(upload) = view.select_image(file) else {
        return Ok(usage_message(META.usage));
    };
    let status = upload.finished().await;

    let mut out = String::new();
    while let Ok(notification) = notifications.try_recv() {
        let _ = writeln!(out, "{}", notification.message());
    }
    if let UploadStatus::Failed(reason) = &status {
        let _ = writeln!(out, "Reason: {}", reason);
    }
    if let Some(avatar) = view.avatar() {
        let _ = writeln!(out, "Picture: {}", avatar.location());
    }

    Ok(out.trim_end().to_owned())
}
