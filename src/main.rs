use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use onefeed::config;
use onefeed::feed;
use onefeed::output::{CombinedFeed, Destination, FeedMetadata};

#[derive(Parser, Debug)]
#[command(
    name = "onefeed",
    about = "Fetches multiple RSS/Atom feeds and outputs a single combined feed",
    after_help = "Config locations are merged from lowest to highest precedence.\n\
                  Each may be a local JSON file or a web URL."
)]
struct Args {
    /// JSON configuration locations, lowest to highest precedence
    #[arg(value_name = "CONFIG", required = true, num_args = 1..)]
    configs: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // A batch job either completes or exits 1 — usage problems and --help
    // included, so schedulers never mistake a no-op invocation for success.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        eprintln!("ERROR: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("CAUSED BY: {cause}");
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let client = feed::build_client();

    let config = config::load(&client, &args.configs)
        .await
        .context("Failed to load configuration")?;

    // Parse the destination before doing any fetch work so a bad output URI
    // fails fast instead of after the whole aggregation
    let destination = Destination::parse(
        &config.output,
        config.upload_username.as_deref(),
        config.upload_password.as_ref(),
    )
    .context("Invalid output destination")?;

    let now = Utc::now();
    let policy = config.policy(now);
    tracing::info!(
        sources = config.source_feeds.len(),
        oldest_allowed = ?policy.oldest_allowed,
        max_items = ?policy.max_items,
        "Starting aggregation"
    );

    let harvest = feed::collect(&client, &config.source_feeds, &policy).await;
    let failed = harvest.sources.iter().filter(|s| s.result.is_err()).count();
    tracing::info!(
        sources = harvest.sources.len(),
        failed = failed,
        collected = harvest.items.len(),
        "Collection finished"
    );

    let items = feed::finalize(harvest.items, policy.max_items);

    let combined = CombinedFeed::build(
        items,
        FeedMetadata {
            title: config.title,
            description: config.description,
            image_url: config.image_url,
        },
        now,
    );

    let xml = onefeed::output::render(&combined, config.format);

    destination
        .write(&xml)
        .context("Failed to write combined feed")?;

    tracing::info!(
        destination = %config.output,
        items = combined.items.len(),
        "Wrote combined feed"
    );
    Ok(())
}
