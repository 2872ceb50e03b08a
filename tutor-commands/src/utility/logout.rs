use tutor_core::{Data, Error};

use crate::CommandMeta;

pub const META: CommandMeta = CommandMeta {
    name: "logout",
    desc: "Forget the stored token and drop cached data.",
    usage: "tutor logout",
};

pub async fn run(data: &Data) -> Result<String, Error> {
    data.credentials.logout()?;
    data.cache.clear();
    Ok("Signed out.".to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tutor_store::QueryKey;
    use tutor_store::model::user::{Role, User};

    use super::run;
    use crate::profile::controller::user_fetcher;
    use crate::testing::{FakeApi, data, scenario_users};

    #[tokio::test]
    async fn clears_credentials_and_cache() {
        let api = Arc::new(FakeApi::with_users(scenario_users()));
        let shared = data(&api, Some(Role::Student));
        let key = QueryKey::user("u1");
        shared
            .cache
            .fetch::<User>(&key, user_fetcher(api.clone(), "u1".to_owned()))
            .await
            .unwrap();

        assert_eq!(run(&shared).await.unwrap(), "Signed out.");
        assert_eq!(shared.credentials.token().unwrap(), None);
        assert!(shared.cache.peek::<User>(&key).unwrap().value.is_none());
    }
}
