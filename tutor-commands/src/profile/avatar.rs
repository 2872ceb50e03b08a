use tutor_store::model::user::User;
use tutor_utils::assets::{placeholder_for, upload_url};

use crate::profile::upload::Preview;

/// Where the profile picture comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Avatar {
    /// Local image still awaiting (or having failed) upload.
    Preview(String),
    /// Image stored by the backend.
    Stored(String),
    /// Gendered default asset.
    Placeholder(&'static str),
}

impl Avatar {
    pub fn resolve(user: &User, preview: Option<&Preview>, api_url: &str) -> Self {
        if let Some(preview) = preview {
            return Self::Preview(preview.uri().to_owned());
        }

        match user.profile_image() {
            Some(path) => Self::Stored(upload_url(api_url, path)),
            None => Self::Placeholder(placeholder_for(user.gender)),
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Self::Preview(uri) | Self::Stored(uri) => uri,
            Self::Placeholder(asset) => asset,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tutor_api::ImageFile;
    use tutor_store::model::user::User;
    use tutor_utils::assets::{PROFILE_PLACEHOLDER_FEMALE, PROFILE_PLACEHOLDER_MALE};

    use super::Avatar;
    use crate::profile::upload::Preview;

    fn user(profile_url: Option<&str>, gender: &str) -> User {
        serde_json::from_value(json!({ "id": "u1", "gender": gender, "profileUrl": profile_url }))
            .unwrap()
    }

    #[test]
    fn placeholder_follows_gender() {
        assert_eq!(
            Avatar::resolve(&user(None, "Male"), None, "http://api"),
            Avatar::Placeholder(PROFILE_PLACEHOLDER_MALE)
        );
        assert_eq!(
            Avatar::resolve(&user(None, "Female"), None, "http://api"),
            Avatar::Placeholder(PROFILE_PLACEHOLDER_FEMALE)
        );
    }

    #[test]
    fn stored_image_resolves_against_api() {
        assert_eq!(
            Avatar::resolve(&user(Some("/u1.png"), "Male"), None, "http://api"),
            Avatar::Stored("http://api/uploads/u1.png".to_owned())
        );
    }

    #[test]
    fn preview_wins_over_stored_image() {
        let preview = Preview::create(&ImageFile::new("new.png", vec![1]));
        let avatar = Avatar::resolve(&user(Some("/u1.png"), "Male"), Some(&preview), "http://api");
        assert_eq!(avatar.location(), preview.uri());
    }
}
