// ============================================================================
// nova-db — CLI database inspection tool for the Nova memory engine
// ============================================================================
// Usage:
//   nova-db stats                            Show database statistics
//   nova-db show-profile --user USER         Dump a user's profile
//   nova-db context --user USER              Render a user's memory context
//   nova-db list-conversations [--user U]    List archived conversations
//   nova-db export --format json             Export full database as JSON
//   nova-db prune --older-than 30            Prune old archived conversations
// ============================================================================

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use nova_core::NovaDb;

/// Nova memory database inspection tool
#[derive(Parser)]
#[command(name = "nova-db", version, about = "Inspect and manage the Nova memory database")]
struct Cli {
    /// Path to the database file (default: ~/.nova/memory.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show database statistics (profiles, conversations, fragments)
    Stats,

    /// Dump a user's full profile
    ShowProfile {
        /// User identifier
        #[arg(long)]
        user: String,
    },

    /// Render a user's memory context block (what the prompt would see)
    Context {
        /// User identifier
        #[arg(long)]
        user: String,
    },

    /// List archived conversations, optionally for one user
    ListConversations {
        /// Filter by user identifier
        #[arg(long)]
        user: Option<String>,
    },

    /// Export full database contents as JSON
    Export {
        /// Output format (currently only json is supported)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Prune old archived conversations
    Prune {
        /// Delete conversations older than this many days
        #[arg(long, default_value = "30")]
        older_than: i64,

        /// Show what would be pruned without actually deleting
        #[arg(long)]
        dry_run: bool,
    },
}

fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("(invalid: {})", ts))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = NovaDb::open(cli.db_path.as_deref())?;

    match cli.command {
        Commands::Stats => cmd_stats(&db),
        Commands::ShowProfile { user } => cmd_show_profile(&db, &user),
        Commands::Context { user } => cmd_context(&db, &user),
        Commands::ListConversations { user } => cmd_list_conversations(&db, user),
        Commands::Export { format } => cmd_export(&db, &format),
        Commands::Prune {
            older_than,
            dry_run,
        } => cmd_prune(&db, older_than, dry_run),
    }
}

fn cmd_stats(db: &NovaDb) -> Result<()> {
    let stats = db.stats()?;

    println!("=== Nova Memory Database Stats ===");
    println!("Database: {}", db.path().display());
    println!();
    println!("Profiles:       {}", stats.total_profiles);
    println!("Fragments:      {}", stats.total_fragments);
    println!("Conversations:  {}", stats.total_conversations);
    println!("Archived tokens: ~{}", stats.archived_tokens);

    Ok(())
}

fn cmd_show_profile(db: &NovaDb, user: &str) -> Result<()> {
    let Some(profile) = db.get_profile(user)? else {
        anyhow::bail!("No profile found for user '{}'", user);
    };

    println!("User:       {}", profile.user_id);
    println!("Name:       {}", profile.name);
    println!("Location:   {}", profile.location);
    println!("Tone:       {}", profile.tone_preference);
    println!("Sessions:   {}", profile.session_count);
    println!("Created:    {}", format_timestamp(profile.created_at));
    println!("Last seen:  {}", format_timestamp(profile.last_session));
    println!("Summary:    {}", profile.conversation_summary);

    if !profile.preferences.is_empty() {
        println!("Likes:      {}", profile.preferences.join(", "));
    }

    if !profile.memory_fragments.is_empty() {
        println!("\n{:<14}  {:<24}  {:<10}  {}", "KEY", "VALUE", "CONFIDENCE", "LAST ACCESSED");
        println!("{}", "-".repeat(76));
        for fragment in &profile.memory_fragments {
            let value = fragment.value.chars().take(24).collect::<String>();
            println!(
                "{:<14}  {:<24}  {:<10.2}  {}",
                fragment.key,
                value,
                fragment.confidence,
                format_timestamp(fragment.last_accessed)
            );
        }
    }

    Ok(())
}

fn cmd_context(db: &NovaDb, user: &str) -> Result<()> {
    let Some(profile) = db.get_profile(user)? else {
        anyhow::bail!("No profile found for user '{}'", user);
    };

    println!("{}", profile.render_context());
    Ok(())
}

fn cmd_list_conversations(db: &NovaDb, user: Option<String>) -> Result<()> {
    let records = db.list_conversations(user.as_deref())?;

    if records.is_empty() {
        println!("No archived conversations found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:<22}  {:>5}  {}",
        "ID", "USER", "ENDED", "MSGS", "SUMMARY"
    );
    println!("{}", "-".repeat(110));

    for record in &records {
        let summary = record.summary.chars().take(40).collect::<String>();
        println!(
            "{:<36}  {:<16}  {:<22}  {:>5}  {}",
            record.id,
            record.user_id,
            format_timestamp(record.end_time),
            record.messages.len(),
            summary
        );
    }

    println!("\nTotal: {} conversations", records.len());
    Ok(())
}

fn cmd_export(db: &NovaDb, format: &str) -> Result<()> {
    if format != "json" {
        anyhow::bail!("Unsupported format '{}'. Only 'json' is supported.", format);
    }

    let profiles = db.list_profiles()?;
    let conversations = db.list_conversations(None)?;
    let stats = db.stats()?;

    let export = serde_json::json!({
        "exported_at": Utc::now().to_rfc3339(),
        "stats": stats,
        "profiles": profiles,
        "conversations": conversations,
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

fn cmd_prune(db: &NovaDb, older_than: i64, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("=== DRY RUN — no data will be deleted ===\n");

        let cutoff = Utc::now().timestamp() - (older_than * 86400);
        let records = db.list_conversations(None)?;
        let pruneable: Vec<_> = records.iter().filter(|r| r.end_time < cutoff).collect();

        println!(
            "Would prune {} conversations older than {} days",
            pruneable.len(),
            older_than
        );
        for record in &pruneable {
            println!(
                "  - {} (ended: {})",
                record.id,
                format_timestamp(record.end_time)
            );
        }
    } else {
        let pruned = db.prune_conversations(older_than)?;
        println!(
            "Pruned {} conversations (older than {} days)",
            pruned, older_than
        );
    }

    Ok(())
}
