//! `cwatch status` -- show configuration status and diagnostics.
//!
//! Discovers the active configuration file, parses it, and displays a
//! summary of the current settings.
//!
//! # Example
//!
//! ```text
//! cwatch status
//! ```

use clap::Args;

use super::{discover_config_path, load_config};

/// Arguments for the `cwatch status` subcommand.
#[derive(Args)]
pub struct StatusArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    println!("cwatch status");
    println!("=============");
    println!();

    match args.config {
        Some(ref path) => println!("Config: {path}"),
        None => match discover_config_path() {
            Some(path) => println!("Config: {}", path.display()),
            None => {
                println!("Config: not found");
                println!("  Searched: $CODEWATCH_CONFIG, ~/.codewatch/config.json");
                println!();
                println!("Using defaults:");
            }
        },
    }

    let config = load_config(args.config.as_deref())?;

    println!();
    println!("Store:");
    println!("  Capacity:         {}", config.store.capacity);
    println!("  Lifetime:         {}s", config.store.lifetime_secs);
    println!("  Tick interval:    {}ms", config.store.tick_interval_ms);
    println!();
    println!("Mailbox (watch):");
    let host = if config.mailbox.host.is_empty() {
        "(not configured)"
    } else {
        &config.mailbox.host
    };
    println!("  Host:             {host}:{}", config.mailbox.port);
    println!("  Folder:           {}", config.mailbox.folder);
    println!("  Sender:           {}", config.mailbox.sender);
    println!("  Search window:    {}", config.mailbox.search_window);
    println!("  Process all new:  {}", config.mailbox.process_all_new);
    println!();
    println!("Reconnect:");
    println!("  Max retries:      {}", config.reconnect.max_retries);
    println!("  Retry delay:      {}s", config.reconnect.retry_delay_secs);
    println!();
    println!("Webhook (serve):");
    let api = if config.webhook.api_base_url.is_empty() {
        "(not configured)"
    } else {
        &config.webhook.api_base_url
    };
    println!("  Bind:             {}", config.webhook.bind);
    println!("  API base URL:     {api}");
    println!("  Token env var:    {}", config.webhook.api_token_env);
    println!("  Cursor path:      {}", config.webhook.cursor_path().display());
    println!("  Excluded labels:  {}", config.webhook.excluded_labels.join(", "));

    Ok(())
}
