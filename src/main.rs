use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use placewise::ai::openai::OpenAiClient;
use placewise::ai::retry::RetryPolicy;
use placewise::config;
use placewise::enrich::{EnrichConfig, Tier};
use placewise::estimate::estimate;
use placewise::pipeline::{self, PipelineRequest, Services};
use placewise::places::PlacesClient;
use placewise::places::paginate::collect_pages;
use placewise::places::types::{COUNT_FIELD_MASK, Rectangle, SearchQuery};
use placewise::translate::GoogleTranslate;

#[derive(Parser)]
#[command(name = "placewise", version)]
#[command(about = "Search places in an area, enrich them with AI insights and rank them by relevance")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full search, enrichment and ranking pipeline.
    Search(SearchArgs),
    /// Count matching places and forecast enrichment time and cost.
    Estimate(AreaArgs),
}

#[derive(Args)]
struct AreaArgs {
    /// Text query, e.g. "coffee shop".
    query: String,
    #[arg(long, allow_negative_numbers = true)]
    south: f64,
    #[arg(long, allow_negative_numbers = true)]
    west: f64,
    #[arg(long, allow_negative_numbers = true)]
    north: f64,
    #[arg(long, allow_negative_numbers = true)]
    east: f64,
}

impl AreaArgs {
    fn query(&self) -> SearchQuery {
        SearchQuery::new(
            self.query.clone(),
            Rectangle::from_corners((self.south, self.west), (self.north, self.east)),
        )
    }
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    area: AreaArgs,

    /// What the ideal place looks like; used for captions and ranking.
    #[arg(long, default_value = "")]
    prompt: String,

    /// Enrichment tier to run (repeatable).
    #[arg(long = "tier", value_enum)]
    tiers: Vec<Tier>,

    #[arg(long, default_value_t = 25)]
    max_in_flight: usize,

    /// Retries per AI call after the first attempt.
    #[arg(long, default_value_t = 8)]
    max_retries: u32,

    /// Overall time budget in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Language names are translated into.
    #[arg(long, default_value = "en")]
    language: String,

    #[arg(long)]
    no_translate: bool,

    /// Write JSON here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("placewise=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let http = config::http_client()?;

    match cli.command {
        Command::Search(args) => search(http, args).await,
        Command::Estimate(area) => {
            let places = PlacesClient::from_env(http)?;
            let query = area.query().with_field_mask(COUNT_FIELD_MASK);
            let found = collect_pages(&places, &query).await?;
            info!(places = found.len(), "counted places");
            println!("{}", serde_json::to_string_pretty(&estimate(found.len()))?);
            Ok(())
        }
    }
}

async fn search(http: reqwest::Client, args: SearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let places = PlacesClient::from_env(http.clone())?;
    let ai = OpenAiClient::from_env(http.clone())?;
    let translator = GoogleTranslate::new(http);

    let request = PipelineRequest {
        query: args.area.query(),
        prompt: args.prompt,
        enrich: EnrichConfig {
            tiers: args.tiers.into_iter().collect(),
            max_in_flight: args.max_in_flight,
            retry: RetryPolicy {
                max_retries: args.max_retries,
                ..RetryPolicy::default()
            },
        },
        translate_to: (!args.no_translate).then_some(args.language),
        timeout: args.timeout_secs.map(Duration::from_secs),
    };

    let services = Services {
        search: &places,
        ai: &ai,
        images: &places,
        translator: &translator,
    };
    let records = pipeline::run(&services, &request).await?;

    let json = serde_json::to_string_pretty(&records)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!(path = %path.display(), records = records.len(), "results written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
