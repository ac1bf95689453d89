use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::application::access::{self, AccessScope, ShareToken};
use crate::application::drag::{DragContext, DragOutcome};
use crate::application::dto::items::ItemDraft;
use crate::application::hierarchy::LoadHierarchy;
use crate::application::ports::items_port::Upload;
use crate::application::services::vault_view::{InteractionEvent, VaultView, ViewUpdate};
use crate::application::use_cases::api_keys::create_key::CreateApiKey;
use crate::application::use_cases::api_keys::delete_key::DeleteApiKey;
use crate::application::use_cases::api_keys::list_keys::ListApiKeys;
use crate::application::use_cases::auth::login::{Login, LoginRequest};
use crate::application::use_cases::auth::logout::Logout;
use crate::application::use_cases::auth::me::GetMe;
use crate::application::use_cases::items::create_item::CreateItem;
use crate::application::use_cases::items::delete_item::{DeleteItem, DeleteOutcome};
use crate::application::use_cases::items::generate_token::GenerateToken;
use crate::application::use_cases::items::load_file::LoadFile;
use crate::application::use_cases::items::move_item::MoveItem;
use crate::application::use_cases::items::reveal_password::RevealPassword;
use crate::application::use_cases::items::update_item::UpdateItem;
use crate::bootstrap::app_context::AppContext;
use crate::domain::items::item::{ItemAction, ItemId, ItemKind, ItemType};
use crate::infrastructure::interaction::{GridLayout, TokioPressTimer, TracingListeners};
use crate::presentation::render;

#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(about = "Personal vault of links, snippets, passwords and files")]
pub struct Cli {
    /// Use a seeded in-memory vault instead of the API
    #[arg(long, global = true)]
    pub memory: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the access token
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Show the logged-in profile
    Me,
    /// List a group (the root when no id is given)
    Ls {
        id: Option<ItemId>,
        /// Share token; opens a read-only view of the shared subtree
        #[arg(long)]
        token: Option<String>,
    },
    /// Perform the primary action of an item
    Open {
        id: ItemId,
        /// Share token of an ancestor group
        #[arg(long)]
        token: Option<String>,
        /// Id of the shared group the token belongs to
        #[arg(long)]
        root: Option<ItemId>,
    },
    /// Create an item
    Add {
        name: String,
        #[arg(long = "type")]
        item_type: ItemType,
        #[arg(long)]
        parent: Option<ItemId>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Edit an item; only changed fields are sent
    Edit {
        id: ItemId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        item_type: Option<ItemType>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Delete an item
    Rm {
        id: ItemId,
        /// Also delete the contents of a non-empty group
        #[arg(long)]
        yes: bool,
    },
    /// Move an item into a group
    Mv {
        id: ItemId,
        parent: ItemId,
        /// Container the item is displayed in (defaults to its current parent)
        #[arg(long)]
        from: Option<ItemId>,
    },
    /// Move an item by replaying a press-and-drag gesture on a card grid
    Drag {
        id: ItemId,
        /// Group card or breadcrumb ancestor to drop on
        target: ItemId,
        #[arg(long)]
        from: Option<ItemId>,
    },
    /// Rotate the share token of an item and print the share link
    Share { id: ItemId },
    /// Manage API keys
    Keys {
        #[command(subcommand)]
        action: KeysCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    List,
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete { id: i64 },
}

pub async fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    let items = ctx.items();
    let notifier = ctx.notifier();
    match command {
        Command::Login { email, password } => {
            let sessions = ctx.sessions();
            Login {
                auth: ctx.auth().as_ref(),
                sessions: sessions.as_ref(),
                notifier: notifier.as_ref(),
            }
            .execute(&LoginRequest { email, password })
            .await?;
            println!("Logged in.");
        }
        Command::Logout => {
            Logout {
                sessions: ctx.sessions().as_ref(),
            }
            .execute()
            .await?;
            println!("Logged out.");
        }
        Command::Me => {
            let me = GetMe {
                auth: ctx.auth().as_ref(),
            }
            .execute()
            .await?;
            println!(
                "{} <{}>",
                me.name.as_deref().unwrap_or("-"),
                me.email.as_deref().unwrap_or("-")
            );
        }
        Command::Ls { id, token } => {
            let scope = resolve_scope(ctx, id, token).await?;
            let model = LoadHierarchy {
                port: items.as_ref(),
                scope: &scope,
            }
            .load(id)
            .await?;
            print!("{}", render::render_listing(&model));
        }
        Command::Open { id, token, root } => {
            let scope = resolve_scope(ctx, root.or(Some(id)), token).await?;
            let item = items.get_one(id, scope.token()).await?;
            match item.primary_action() {
                ItemAction::OpenLink(url) => println!("{url}"),
                ItemAction::CopyText(text) => println!("{text}"),
                ItemAction::RevealPassword(id) => {
                    let text = RevealPassword {
                        port: items.as_ref(),
                        notifier: notifier.as_ref(),
                    }
                    .execute(&scope, id)
                    .await?;
                    println!("{text}");
                }
                ItemAction::ViewFile(file) => {
                    let text = LoadFile {
                        port: items.as_ref(),
                    }
                    .execute(&scope, &file)
                    .await?;
                    print!("{text}");
                }
                ItemAction::DownloadFile(file) => {
                    println!("{}/{}", ctx.cfg.api_url, file.path.trim_start_matches('/'));
                }
                ItemAction::OpenGroup(id) => {
                    let model = LoadHierarchy {
                        port: items.as_ref(),
                        scope: &scope,
                    }
                    .load(Some(id))
                    .await?;
                    print!("{}", render::render_listing(&model));
                }
                ItemAction::Unavailable(id) => println!("Item {id} has no file attached."),
            }
        }
        Command::Add {
            name,
            item_type,
            parent,
            text,
            file,
            logo,
        } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let mut draft = ItemDraft::new(name, item_type);
            draft.text = text;
            draft.file = read_upload(file.as_deref()).await?;
            draft.logo = read_upload(logo.as_deref()).await?;
            let item = CreateItem {
                port: items.as_ref(),
                notifier: notifier.as_ref(),
            }
            .execute(&scope, parent, draft)
            .await?;
            println!("{}", render::render_item(&item));
        }
        Command::Edit {
            id,
            name,
            item_type,
            text,
            file,
            logo,
        } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let original = items.get_one(id, None).await?;
            let mut draft = ItemDraft::new(
                name.unwrap_or_else(|| original.name.clone()),
                item_type.unwrap_or(original.item_type()),
            );
            draft.text = text.or_else(|| match &original.kind {
                ItemKind::Link { text } | ItemKind::Copy { text } | ItemKind::Password { text } => {
                    Some(text.clone())
                }
                _ => None,
            });
            draft.file = read_upload(file.as_deref()).await?;
            draft.logo = read_upload(logo.as_deref()).await?;
            let updated = UpdateItem {
                port: items.as_ref(),
                notifier: notifier.as_ref(),
            }
            .execute(&scope, &original, draft)
            .await?;
            match updated {
                Some(item) => println!("{}", render::render_item(&item)),
                None => println!("Nothing changed."),
            }
        }
        Command::Rm { id, yes } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let item = items.get_one(id, None).await?;
            let outcome = DeleteItem {
                port: items.as_ref(),
                notifier: notifier.as_ref(),
            }
            .execute(&scope, &item, yes)
            .await?;
            match outcome {
                DeleteOutcome::Deleted => println!("Deleted {}.", item.name),
                DeleteOutcome::NeedsConfirmation { children } => println!(
                    "{} still holds {children} item(s); rerun with --yes to delete them too.",
                    item.name
                ),
            }
        }
        Command::Mv { id, parent, from } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let from = match from {
                Some(f) => Some(f),
                None => items.get_one(id, None).await?.parent_id(),
            };
            let current = LoadHierarchy {
                port: items.as_ref(),
                scope: &scope,
            }
            .load(from)
            .await?;
            let done = MoveItem {
                port: items.as_ref(),
                notifier: notifier.as_ref(),
            }
            .execute(&current, id, parent)
            .await?;
            if let Some(model) = done.refreshed {
                print!("{}", render::render_listing(&model));
            }
        }
        Command::Drag { id, target, from } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let from = match from {
                Some(f) => Some(f),
                None => items.get_one(id, None).await?.parent_id(),
            };
            replay_drag(ctx, scope, from, id, target).await?;
        }
        Command::Share { id } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let link = GenerateToken {
                port: items.as_ref(),
                notifier: notifier.as_ref(),
                public_base: &ctx.cfg.public_base_url,
            }
            .execute(&scope, id)
            .await?;
            println!("{}", link.url);
        }
        Command::Keys { action } => {
            let scope = resolve_scope(ctx, None, None).await?;
            let keys = ctx.api_keys();
            match action {
                KeysCommand::List => {
                    let list = ListApiKeys {
                        port: keys.as_ref(),
                    }
                    .execute(&scope)
                    .await?;
                    if list.is_empty() {
                        println!("No API keys.");
                    }
                    for key in list {
                        println!("{:>5}  {}  {}", key.id, key.name, key.description);
                    }
                }
                KeysCommand::Create { name, description } => {
                    let key = CreateApiKey {
                        port: keys.as_ref(),
                        notifier: notifier.as_ref(),
                    }
                    .execute(&scope, &name, &description)
                    .await?;
                    println!("{}  {}", key.id, key.name);
                    if let Some(token) = key.token {
                        println!("Token (shown once): {token}");
                    }
                }
                KeysCommand::Delete { id } => {
                    DeleteApiKey {
                        port: keys.as_ref(),
                        notifier: notifier.as_ref(),
                    }
                    .execute(&scope, id)
                    .await?;
                }
            }
        }
    }
    Ok(())
}

async fn resolve_scope(
    ctx: &AppContext,
    node: Option<ItemId>,
    token: Option<String>,
) -> anyhow::Result<AccessScope> {
    let share = match (node, token) {
        (Some(item_id), Some(token)) => Some(ShareToken { item_id, token }),
        (None, Some(_)) => anyhow::bail!("a share token needs the id of the shared item"),
        (_, None) => None,
    };
    let session = ctx.sessions().load().await?;
    access::resolve(session.as_ref(), share.as_ref())
        .map_err(|_| anyhow::anyhow!("not logged in, run `vault login <email>` first"))
}

async fn read_upload(path: Option<&Path>) -> anyhow::Result<Option<Upload>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    Ok(Some(Upload {
        mimetype: mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string(),
        filename,
        bytes,
    }))
}

/// Drives the card state machine with synthetic pointer events: press on the
/// item, wait for the drag timer, move onto the target, release.
async fn replay_drag(
    ctx: &AppContext,
    scope: AccessScope,
    from: Option<ItemId>,
    item: ItemId,
    target: ItemId,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let grid = Arc::new(GridLayout::new(4));
    let drag = DragContext::new(
        ctx.cfg.drag(),
        grid.clone(),
        Arc::new(TracingListeners),
        Arc::new(TokioPressTimer::new(tx.clone())?),
    );
    let mut view = VaultView::open(ctx.items(), ctx.notifier(), drag, tx, scope, from).await?;
    if !view.has_drag_machines() {
        anyhow::bail!("items cannot be dragged in a shared view");
    }
    grid.arrange(view.model());
    let start = grid
        .card_center(item)
        .context("item is not in the displayed container")?;
    let origin = grid.card_origin(item).unwrap_or_default();
    let drop_at = grid
        .card_center(target)
        .or_else(|| grid.crumb_center(target))
        .context("target is neither a card nor a breadcrumb entry of this view")?;

    view.handle(InteractionEvent::PointerDown {
        item,
        pointer: start,
        origin,
    });
    loop {
        let event = rx.recv().await.context("press timer dropped")?;
        match view.handle(event) {
            Some(ViewUpdate::Card {
                outcome: DragOutcome::DragStarted { .. },
                ..
            }) => break,
            Some(ViewUpdate::Card {
                outcome: DragOutcome::ShowOverlay | DragOutcome::Aborted,
                ..
            }) => anyhow::bail!("press did not turn into a drag"),
            _ => {}
        }
    }

    view.handle(InteractionEvent::PointerMove { pointer: drop_at });
    match view.handle(InteractionEvent::PointerUp { pointer: drop_at }) {
        Some(ViewUpdate::Card {
            outcome: DragOutcome::Commit { .. },
            ..
        }) => {}
        _ => anyhow::bail!("item {target} does not accept drops"),
    }

    loop {
        let event = rx.recv().await.context("commit task dropped")?;
        match view.handle(event) {
            Some(ViewUpdate::Card {
                outcome: DragOutcome::Committed,
                ..
            }) => {
                print!("{}", render::render_listing(view.model()));
                return Ok(());
            }
            Some(ViewUpdate::Card {
                outcome: DragOutcome::ReturnToOrigin,
                ..
            }) => anyhow::bail!("move was rejected, item returned to its place"),
            _ => {}
        }
    }
}
