mod auth;
mod instrument;
mod market;
mod search;
mod watchlist;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tickr_core::{
    FileTokenStore, Gateway, MemoryGateway, RestGateway, RestoreOutcome, Session, TickrConfig,
    TokenStore, UtcDateTime, ValidationError, Watchlist, WatchlistId, WatchlistManager,
};
use tracing::debug;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::{Report, ReportError, ReportMeta};

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<ReportError>,
    pub lines: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<ReportError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }
}

/// Services shared by every command.
pub struct Context {
    pub config: TickrConfig,
    pub gateway: Arc<dyn Gateway>,
    pub session: Session,
    pub warnings: Vec<String>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = TickrConfig::from_env()?;
        if let Some(api_url) = &cli.api_url {
            config.api_url = api_url.trim_end_matches('/').to_owned();
        }
        if let Some(path) = &cli.session_file {
            config.session_path = path.clone();
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.session_path));
        let memory = cli.offline.then(|| Arc::new(MemoryGateway::new()));
        let gateway: Arc<dyn Gateway> = match &memory {
            Some(memory) => memory.clone(),
            None => Arc::new(
                RestGateway::new(config.api_url.clone(), store.clone())
                    .with_timeout_ms(config.timeout_ms),
            ),
        };
        debug!(api_url = %config.api_url, offline = cli.offline, "gateway configured");

        let mut session = Session::new(gateway.clone(), store, config.session_ttl);
        let mut warnings = Vec::new();
        match session.restore() {
            RestoreOutcome::Restored | RestoreOutcome::Empty => {}
            RestoreOutcome::Expired => {
                warnings.push(String::from("stored session expired; please log in again"));
            }
            RestoreOutcome::Corrupt => {
                warnings.push(String::from("stored session was unreadable and has been cleared"));
            }
        }

        if let Some(memory) = memory {
            warnings.push(String::from(
                "offline mode: changes live only for this invocation",
            ));
            if let Some(user) = session.user() {
                memory.sign_in(user.clone());
            }
        }

        Ok(Self {
            config,
            gateway,
            session,
            warnings,
        })
    }

    pub fn require_login(&self) -> Result<(), CliError> {
        if self.session.is_authenticated() {
            return Ok(());
        }
        Err(CliError::Auth(String::from(
            "not logged in; run `tickr login` first",
        )))
    }

    /// Watchlist manager with a freshly fetched collection.
    pub async fn watchlists(&self) -> Result<WatchlistManager, CliError> {
        self.require_login()?;
        let mut manager = WatchlistManager::new(self.gateway.clone())
            .with_resolve_page_size(self.config.search.page_size);
        manager.refresh().await?;
        Ok(manager)
    }
}

/// Resolves a watchlist argument that may be an id or a name.
pub fn find_watchlist<'a>(
    manager: &'a WatchlistManager,
    key: &str,
) -> Result<&'a Watchlist, CliError> {
    let by_id = WatchlistId::parse(key)
        .ok()
        .and_then(|id| manager.watchlist(&id));
    by_id
        .or_else(|| manager.find_by_name(key))
        .ok_or_else(|| {
            ValidationError::UnknownWatchlist {
                id: key.to_owned(),
            }
            .into()
        })
}

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let started = Instant::now();
    let mut context = Context::from_cli(cli)?;

    let result = match &cli.command {
        Command::Login(args) => auth::login(&mut context, args).await?,
        Command::Register(args) => auth::register(&mut context, args).await?,
        Command::Logout => auth::logout(&mut context),
        Command::Whoami(args) => auth::whoami(&context, args).await?,
        Command::Watchlist(args) => watchlist::run(&context, args).await?,
        Command::Instrument(args) => instrument::run(&context, args).await?,
        Command::Search(args) => search::run(&context, args).await?,
        Command::Market(args) => market::run(&context, args, cli).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        lines,
    } = result;

    let mut all_warnings = context.warnings;
    all_warnings.extend(warnings);

    Ok(Report {
        meta: ReportMeta {
            request_id: Uuid::new_v4().to_string(),
            generated_at: UtcDateTime::now(),
            latency_ms: started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64,
            warnings: all_warnings,
        },
        data,
        errors,
        lines,
    })
}
