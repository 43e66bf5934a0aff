//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use brokersite_client::ApiClient;
use brokersite_core::seo::{self, Field, sitemap, tags};
use brokersite_core::{
    CancelToken, ContactSubmitter, ContentStore, IconRegistry, PageKey, ResolvedSeo, Route,
    SeoPatch, SeoResolver, StoreOptions,
};
use brokersite_shared::{
    ApiSettings, AppConfig, ContactSubmission, ContentFeed, FeedConfig, captcha_site_key,
    expand_home, init_config, load_config,
};
use brokersite_storage::Storage;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// brokersite: content feed, SEO metadata, and contact form tooling.
#[derive(Parser)]
#[command(
    name = "brokersite",
    version,
    about = "Fetch and cache the site content feed, resolve page SEO metadata, and send contact forms.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// API base URL (overrides the env var and config file).
    #[arg(long, global = true)]
    pub api_host: Option<String>,

    /// Path of the local cache database.
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Content feed operations.
    Feed {
        #[command(subcommand)]
        action: FeedAction,
    },

    /// SEO metadata, sitemap, and robots output.
    Seo {
        #[command(subcommand)]
        action: SeoAction,
    },

    /// Send a contact form submission.
    Contact {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long)]
        message: Option<String>,

        /// Bot-verification token.
        #[arg(long)]
        token: Option<String>,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Feed subcommands.
#[derive(Subcommand)]
pub(crate) enum FeedAction {
    /// Print the current feed as JSON (fetching it first unless --offline).
    Show {
        /// Only read the local cache.
        #[arg(long)]
        offline: bool,
    },
    /// Fetch the feed now and update the cache.
    Refresh,
    /// Poll the feed until interrupted.
    Watch {
        /// Minutes between fetches (defaults to the configured interval).
        #[arg(long)]
        interval_mins: Option<u64>,
    },
    /// Show the cached feed and recent fetch history.
    Status {
        /// Number of history rows.
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    /// Delete the cached feed.
    Clear,
    /// Check the cached feed's icon keys against the registry.
    Validate,
}

/// SEO subcommands.
#[derive(Subcommand)]
pub(crate) enum SeoAction {
    /// Resolve metadata for a page key or route path.
    Page {
        /// Page key (home, about, services, faq, ...).
        #[arg(required_unless_present = "path")]
        key: Option<String>,

        /// Route path instead of a key (e.g. /privacy-policy).
        #[arg(long, conflicts_with = "key")]
        path: Option<String>,

        /// Per-call title override.
        #[arg(long)]
        title: Option<String>,

        /// Per-call description override.
        #[arg(long)]
        description: Option<String>,

        /// Per-call keywords override (comma-separated).
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,

        /// Show which layer supplied each field.
        #[arg(long)]
        explain: bool,

        /// Also run the metadata audit.
        #[arg(long)]
        audit: bool,
    },
    /// Resolve metadata for a single service page.
    Service {
        /// Service id from the feed.
        id: String,

        #[arg(long)]
        explain: bool,
    },
    /// Print sitemap.xml.
    Sitemap,
    /// Print robots.txt.
    Robots,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "brokersite=info",
        1 => "brokersite=debug",
        _ => "brokersite=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Settings shared by every command, resolved once from flags + env + file.
struct Globals {
    config: AppConfig,
    api_host: Option<String>,
    cache_path: PathBuf,
}

impl Globals {
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = load_config()?;
        let cache_path = match &cli.cache {
            Some(path) => path.clone(),
            None => expand_home(&config.feed.cache_path)?,
        };
        Ok(Self {
            config,
            api_host: cli.api_host.clone(),
            cache_path,
        })
    }

    fn client(&self) -> Result<ApiClient> {
        let settings = ApiSettings::resolve(&self.config, self.api_host.as_deref())?;
        Ok(ApiClient::new(settings)?)
    }

    async fn store(&self) -> Result<ContentStore> {
        let storage = Storage::open(&self.cache_path).await?;
        let options = StoreOptions::from_config(&self.config.feed);
        Ok(ContentStore::open(self.client()?, storage, options).await?)
    }

    /// The cached feed, if any. Never touches the network.
    async fn cached_feed(&self) -> Result<Option<ContentFeed>> {
        if !self.cache_path.exists() {
            return Ok(None);
        }
        let storage = Storage::open(&self.cache_path).await?;
        Ok(storage.load_feed(&self.config.feed.storage_key).await?)
    }
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let globals = Globals::resolve(&cli)?;

    match cli.command {
        Command::Feed { action } => match action {
            FeedAction::Show { offline } => cmd_feed_show(&globals, offline).await,
            FeedAction::Refresh => cmd_feed_refresh(&globals).await,
            FeedAction::Watch { interval_mins } => cmd_feed_watch(&globals, interval_mins).await,
            FeedAction::Status { limit } => cmd_feed_status(&globals, limit).await,
            FeedAction::Clear => cmd_feed_clear(&globals).await,
            FeedAction::Validate => cmd_feed_validate(&globals).await,
        },
        Command::Seo { action } => match action {
            SeoAction::Page {
                key,
                path,
                title,
                description,
                keywords,
                explain,
                audit,
            } => {
                let key = match (key, path) {
                    (_, Some(path)) => Route::from_path(&path).page_key(),
                    (Some(key), None) => PageKey::parse(&key),
                    (None, None) => return Err(eyre!("either a page key or --path is required")),
                };
                let patch = SeoPatch {
                    title,
                    description,
                    keywords,
                    ..SeoPatch::default()
                };
                cmd_seo_page(&globals, &key, &patch, explain, audit).await
            }
            SeoAction::Service { id, explain } => cmd_seo_service(&globals, &id, explain).await,
            SeoAction::Sitemap => cmd_seo_sitemap(&globals).await,
            SeoAction::Robots => cmd_seo_robots(&globals),
        },
        Command::Contact {
            name,
            email,
            phone,
            message,
            token,
        } => {
            let form = ContactSubmission {
                name,
                email,
                phone,
                message,
                verification_token: token,
            };
            cmd_contact(&globals, &form).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&globals),
        },
    }
}

// ---------------------------------------------------------------------------
// Feed commands
// ---------------------------------------------------------------------------

async fn cmd_feed_show(globals: &Globals, offline: bool) -> Result<()> {
    let store = globals.store().await?;

    if !offline {
        let spinner = spinner("Fetching content feed")?;
        let result = store.refresh(&CancelToken::new()).await;
        spinner.finish_and_clear();
        if let Err(e) = result {
            warn!(error = %e, "refresh failed, showing cached feed");
        }
    }

    let state = store.get();
    let Some(feed) = state.data else {
        return Err(match state.error {
            Some(error) => eyre!("no feed available: {error}"),
            None => eyre!("no cached feed; run `brokersite feed refresh`"),
        });
    };
    if let Some(error) = &state.error {
        eprintln!("warning: showing stale feed ({error})");
    }

    println!("{}", serde_json::to_string_pretty(feed.as_ref())?);
    Ok(())
}

async fn cmd_feed_refresh(globals: &Globals) -> Result<()> {
    let store = globals.store().await?;

    let spinner = spinner("Fetching content feed")?;
    let result = store.refresh(&CancelToken::new()).await;
    spinner.finish_and_clear();
    let feed = result?;

    let history = store.history(1).await?;
    let outcome = history
        .first()
        .map(|r| r.outcome.as_str())
        .unwrap_or("updated");

    println!();
    println!("  Feed refreshed ({outcome})");
    println!("  Name:      {}", feed.name);
    println!("  Services:  {}", feed.services.items.len());
    println!("  FAQs:      {}", feed.faq.items.len());
    println!("  Partners:  {}", feed.banking_partners.len());
    println!("  Cache:     {}", globals.cache_path.display());
    println!();
    Ok(())
}

async fn cmd_feed_watch(globals: &Globals, interval_mins: Option<u64>) -> Result<()> {
    let mut store = globals.store().await?;
    if let Some(mins) = interval_mins {
        let mut options = store.options().clone();
        options.refetch_interval = FeedConfig::interval_from_mins(mins);
        // Rebuild with the overridden interval; the cache is re-read.
        store = ContentStore::open(
            globals.client()?,
            Storage::open(&globals.cache_path).await?,
            options,
        )
        .await?;
    }

    let store = Arc::new(store);
    let cancel = CancelToken::new();
    let mut updates = store.subscribe();
    let handle = Arc::clone(&store).start(&cancel);

    info!(
        interval_secs = store.options().refetch_interval.as_secs(),
        "watching feed, press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                match (&state.data, &state.error) {
                    (_, Some(error)) => println!("refresh failed: {error}"),
                    (Some(feed), None) => println!(
                        "feed updated: {} ({} services, {} FAQs)",
                        feed.name,
                        feed.services.items.len(),
                        feed.faq.items.len()
                    ),
                    (None, None) => {}
                }
            }
        }
    }

    handle
        .await
        .map_err(|e| eyre!("polling task failed: {e}"))?;
    Ok(())
}

async fn cmd_feed_status(globals: &Globals, limit: u32) -> Result<()> {
    if !globals.cache_path.exists() {
        println!("No cache at {}", globals.cache_path.display());
        return Ok(());
    }

    let storage = Storage::open_readonly(&globals.cache_path).await?;
    let entry = storage.get_entry(&globals.config.feed.storage_key).await?;

    println!();
    println!("  Cache:   {}", globals.cache_path.display());
    println!("  Key:     {}", globals.config.feed.storage_key);
    match &entry {
        Some(entry) => {
            println!("  Updated: {}", entry.updated_at.to_rfc3339());
            println!("  Hash:    {}", entry.content_hash);
            println!("  Size:    {} bytes", entry.value.len());
        }
        None => println!("  Feed:    (not cached)"),
    }

    let history = storage.recent_fetches(limit).await?;
    if !history.is_empty() {
        println!();
        println!("  Recent fetches:");
        for record in &history {
            let hash = record
                .content_hash
                .as_deref()
                .map(|h| &h[..h.len().min(12)])
                .unwrap_or("-");
            let detail = record.detail.as_deref().unwrap_or("");
            println!(
                "    {}  {:<9}  {hash:<12}  {detail}",
                record.fetched_at, record.outcome
            );
        }
    }
    println!();
    Ok(())
}

async fn cmd_feed_clear(globals: &Globals) -> Result<()> {
    if !globals.cache_path.exists() {
        println!("Nothing to clear.");
        return Ok(());
    }
    let store = globals.store().await?;
    if store.clear().await? {
        println!("Cached feed removed.");
    } else {
        println!("Nothing to clear.");
    }
    Ok(())
}

async fn cmd_feed_validate(globals: &Globals) -> Result<()> {
    let feed = globals
        .cached_feed()
        .await?
        .ok_or_else(|| eyre!("no cached feed; run `brokersite feed refresh`"))?;

    let unknown = IconRegistry::new().validate_feed(&feed);
    if unknown.is_empty() {
        println!("All {} icon keys are known.", feed.icon_keys().count());
        return Ok(());
    }

    for key in &unknown {
        println!("unknown icon key: {key}");
    }
    Err(eyre!("{} unknown icon key(s)", unknown.len()))
}

// ---------------------------------------------------------------------------
// SEO commands
// ---------------------------------------------------------------------------

/// Feed for SEO commands: the cached one, or none (fallback-only output).
async fn seo_feed(globals: &Globals) -> Option<ContentFeed> {
    match globals.cached_feed().await {
        Ok(Some(feed)) => Some(feed),
        Ok(None) => {
            warn!("no cached feed, using fallback metadata only");
            None
        }
        Err(e) => {
            warn!(error = %e, "cached feed unavailable, using fallback metadata only");
            None
        }
    }
}

fn print_resolved(
    resolver: &SeoResolver,
    resolved: &ResolvedSeo,
    feed: Option<&ContentFeed>,
    explain: bool,
    audit: bool,
) -> Result<()> {
    let page = &resolved.page;
    let site = resolver.site();
    let site_name = resolver.site_name(feed);

    let mut output = serde_json::json!({
        "documentTitle": resolver.document_title(page, feed),
        "page": page,
        "robots": tags::page_robots(page),
        "openGraph": tag_map(tags::open_graph(page, site, site_name)),
        "twitter": tag_map(tags::twitter_card(page, site)),
    });

    if explain {
        output["origins"] = serde_json::to_value(
            Field::ALL
                .iter()
                .map(|f| (f.as_str().to_string(), resolved.origin(*f).as_str().to_string()))
                .collect::<std::collections::BTreeMap<_, _>>(),
        )?;
    }
    if audit {
        output["audit"] = serde_json::to_value(seo::audit(page))?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn cmd_seo_page(
    globals: &Globals,
    key: &PageKey,
    patch: &SeoPatch,
    explain: bool,
    audit: bool,
) -> Result<()> {
    let resolver = SeoResolver::from_config(&globals.config);
    let feed = seo_feed(globals).await;
    let patch = (!patch.is_empty()).then_some(patch);

    let resolved = resolver.resolve(key, feed.as_ref(), patch);
    print_resolved(&resolver, &resolved, feed.as_ref(), explain, audit)
}

async fn cmd_seo_service(globals: &Globals, id: &str, explain: bool) -> Result<()> {
    let resolver = SeoResolver::from_config(&globals.config);
    let feed = seo_feed(globals).await;

    let resolved = resolver.resolve_service(id, feed.as_ref(), None);
    print_resolved(&resolver, &resolved, feed.as_ref(), explain, false)
}

async fn cmd_seo_sitemap(globals: &Globals) -> Result<()> {
    let resolver = SeoResolver::from_config(&globals.config);
    let feed = seo_feed(globals).await;

    let entries = sitemap::entries(&resolver, feed.as_ref(), chrono::Utc::now());
    print!("{}", sitemap::to_xml(&entries));
    Ok(())
}

fn cmd_seo_robots(globals: &Globals) -> Result<()> {
    print!("{}", sitemap::robots_txt(&globals.config.site.url));
    Ok(())
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

async fn cmd_contact(globals: &Globals, form: &ContactSubmission) -> Result<()> {
    if form.token().is_none() && captcha_site_key(&globals.config).is_some() {
        warn!("a verification site key is configured but no --token was given");
    }

    let submitter = ContactSubmitter::new(globals.client()?);

    let spinner = spinner("Sending message")?;
    let result = submitter.submit(form).await;
    spinner.finish_and_clear();
    let outcome = result?;

    println!();
    println!("  Message sent.");
    if !outcome.message.is_empty() {
        println!("  Server:     {}", outcome.message);
    }
    println!("  Request ID: {}", outcome.request_id);
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(globals: &Globals) -> Result<()> {
    let settings = ApiSettings::resolve(&globals.config, globals.api_host.as_deref())?;
    println!("# resolved API host: {}", settings.base_url);
    println!("# resolved cache:    {}", globals.cache_path.display());
    println!("{}", toml::to_string_pretty(&globals.config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An indicatif spinner that ticks until cleared.
fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("invalid spinner template: {e}"))?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

fn tag_map(list: tags::TagList) -> serde_json::Map<String, serde_json::Value> {
    list.into_iter()
        .map(|(property, content)| (property.to_string(), serde_json::Value::String(content)))
        .collect()
}
