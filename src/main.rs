use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use vault::application::access::Session;
use vault::application::ports::session_store::SessionEvent;
use vault::bootstrap::app_context::{AppContext, AppServices};
use vault::bootstrap::config::Config;
use vault::infrastructure::memory::InMemoryVault;
use vault::presentation::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "vault=debug,reqwest=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;
    tracing::debug!(?cfg, memory = cli.memory, "config_loaded");

    let ctx = if cli.memory {
        let vault = Arc::new(InMemoryVault::new());
        seed_demo(&vault).await;
        let ctx = AppContext::new(cfg, AppServices::memory(vault));
        ctx.sessions()
            .save(&Session {
                access_token: "local".into(),
            })
            .await?;
        ctx
    } else {
        let services = AppServices::remote(&cfg)?;
        AppContext::new(cfg, services)
    };

    let mut session_events = ctx.subscribe_session_events();
    tokio::spawn(async move {
        while let Ok(event) = session_events.recv().await {
            if event == SessionEvent::Expired {
                tracing::warn!("session expired, log in again with `vault login <email>`");
            }
        }
    });

    cli::run(&ctx, cli.command).await
}

async fn seed_demo(vault: &InMemoryVault) {
    let work = vault.seed_group("Work", None).await;
    vault
        .seed_link("Tracker", "https://tracker.example.com", Some(work))
        .await;
    vault
        .seed_copy("Deploy", "git push production main", Some(work))
        .await;
    let personal = vault.seed_group("Personal", None).await;
    vault
        .seed_password("Bank", "correct horse battery staple", Some(personal))
        .await;
    vault
        .seed_view("Notes", "notes.md", "# Notes\n\n- renew passport\n", Some(personal))
        .await;
    vault
        .seed_link("Search", "https://duckduckgo.com", None)
        .await;
}
