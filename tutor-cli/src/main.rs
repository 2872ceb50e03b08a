mod config;

use std::env;

use tracing::{debug, error};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tutor_api::HttpAccessor;
use tutor_core::Data;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|metadata| {
            let target = metadata.target();

            let within_info_level = *metadata.level() <= tracing::Level::INFO;
            if !within_info_level {
                return false;
            }

            !(target.starts_with("hyper") || target.starts_with("reqwest::connect"))
        }));

    tracing_subscriber::registry().with(fmt_layer).init();

    // Load the .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let credentials = config.credential_store();
    if credentials.is_persistent() {
        debug!(path = %config.credentials_path.display(), "using file credential store");
    }

    let accessor = HttpAccessor::from_env(credentials.clone())?;
    debug!(api_url = accessor.base_url(), "api client ready");
    let data = Data::from_accessor(accessor, config.entity_cache(), credentials);

    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "help".to_owned());
    let rest: Vec<String> = args.collect();

    match tutor_commands::dispatch(&data, &command, &rest).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            error!(?err, command = %command, "command failed");
            Err(err)
        }
    }
}
