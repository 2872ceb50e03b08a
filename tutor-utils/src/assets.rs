use tutor_store::model::user::Gender;

/// Animation shown when a profile cannot be loaded.
pub const NOT_FOUND_ANIMATION: &str = "not-found.json";
pub const PROFILE_PLACEHOLDER_MALE: &str = "/profile-m.png";
pub const PROFILE_PLACEHOLDER_FEMALE: &str = "/profile-w.png";

/// Placeholder picture for users without a stored image.
pub fn placeholder_for(gender: Option<Gender>) -> &'static str {
    match gender {
        Some(Gender::Male) => PROFILE_PLACEHOLDER_MALE,
        _ => PROFILE_PLACEHOLDER_FEMALE,
    }
}

/// Public URL of a stored profile image path such as `/u1.png`.
pub fn upload_url(api_url: &str, profile_path: &str) -> String {
    let base = api_url.trim_end_matches('/');
    if profile_path.starts_with('/') {
        format!("{}/uploads{}", base, profile_path)
    } else {
        format!("{}/uploads/{}", base, profile_path)
    }
}
