use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use wity_core::{
    evaluate_access, filesystem_cache, resolve_action, AuthorizationState, Context, CoreConfig,
};

#[derive(Parser, Debug)]
#[command(name = "wity", about = "Inspect application manifests and access decisions")]
struct Args {
    /// Configuration file (defaults to ~/.wity/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the applications directory
    #[arg(long)]
    apps_dir: Option<PathBuf>,

    /// Override the cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the parsed manifest of an application
    Show { app: String },

    /// Resolve request tokens to an action
    Resolve {
        app: String,
        /// Resolve against admin actions
        #[arg(long)]
        admin: bool,
        tokens: Vec<String>,
    },

    /// Evaluate access to an application or one of its actions
    Check {
        app: String,
        /// Action to check; omit to check access to the application
        #[arg(default_value = "")]
        action: String,
        #[arg(long)]
        admin: bool,
        /// Session authorization state as JSON (anonymous when omitted)
        #[arg(long)]
        session: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::load_default()?,
    };
    if let Some(dir) = args.apps_dir {
        config.apps_dir = dir;
    }
    if let Some(dir) = args.cache_dir {
        config.cache_dir = dir;
    }

    tracing::debug!(
        "Using apps directory {:?} and cache directory {:?}",
        config.apps_dir,
        config.cache_dir
    );
    let cache = filesystem_cache(&config);

    let output = match args.command {
        Command::Show { app } => {
            let manifest = cache.load(&app)?;
            serde_json::to_value(&*manifest)?
        }
        Command::Resolve { app, admin, mut tokens } => {
            let manifest = cache.load(&app)?;
            let action = resolve_action(&manifest, context(admin), &mut tokens);
            json!({
                "app": app,
                "context": context(admin),
                "action": action,
                "remaining": tokens,
            })
        }
        Command::Check {
            app,
            action,
            admin,
            session,
        } => {
            let state = match session {
                Some(path) => load_session(&path)?,
                None => AuthorizationState::anonymous(),
            };
            let manifest = cache.load(&app)?;
            let decision = evaluate_access(&manifest, &app, &action, context(admin), &state);
            match decision.into_result() {
                Ok(allowed) => json!({ "app": app, "action": action, "allowed": allowed }),
                Err(note) => json!({ "app": app, "action": action, "allowed": false, "error": note }),
            }
        }
    };

    tracing::debug!("Manifest cache stats: {:?}", cache.stats());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn context(admin: bool) -> Context {
    if admin {
        Context::Admin
    } else {
        Context::Front
    }
}

fn load_session(path: &Path) -> anyhow::Result<AuthorizationState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("invalid session file {:?}", path))
}
