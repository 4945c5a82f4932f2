use serde::Serialize;
use tickr_core::{format_price, InstrumentRow, Watchlist, WatchlistManager};

use crate::cli::{WatchlistArgs, WatchlistCommand};
use crate::error::CliError;
use crate::output::table;

use super::{find_watchlist, CommandResult, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchlistView<'a> {
    #[serde(flatten)]
    watchlist: &'a Watchlist,
    selected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchlistRows<'a> {
    id: &'a str,
    name: &'a str,
    rows: Vec<InstrumentRow>,
}

pub async fn run(context: &Context, args: &WatchlistArgs) -> Result<CommandResult, CliError> {
    let mut manager = context.watchlists().await?;

    match &args.command {
        WatchlistCommand::List => list(&manager),
        WatchlistCommand::Create { name } => {
            let created = manager.create(name).await?;
            let lines = vec![format!("Created watchlist '{}' ({})", created.name, created.id)];
            Ok(CommandResult::ok(serde_json::to_value(&created)?).with_lines(lines))
        }
        WatchlistCommand::Rename {
            watchlist,
            new_name,
        } => {
            let id = find_watchlist(&manager, watchlist)?.id.clone();
            let renamed = manager.rename(&id, new_name).await?;
            let lines = vec![format!("Renamed watchlist {} to '{}'", renamed.id, renamed.name)];
            Ok(CommandResult::ok(serde_json::to_value(&renamed)?).with_lines(lines))
        }
        WatchlistCommand::Delete { watchlist } => {
            let target = find_watchlist(&manager, watchlist)?.clone();
            manager.delete(&target.id).await?;
            let data = serde_json::json!({
                "deleted": target.id,
                "selected": manager.selected_id(),
            });
            let lines = vec![format!("Deleted watchlist '{}'", target.name)];
            Ok(CommandResult::ok(data).with_lines(lines))
        }
        WatchlistCommand::Show { watchlist } => {
            if let Some(key) = watchlist {
                let id = find_watchlist(&manager, key)?.id.clone();
                manager.select(&id)?;
            }
            show(&manager)
        }
    }
}

fn list(manager: &WatchlistManager) -> Result<CommandResult, CliError> {
    let selected = manager.selected_id();
    let views = manager
        .watchlists()
        .iter()
        .map(|watchlist| WatchlistView {
            watchlist,
            selected: Some(&watchlist.id) == selected,
        })
        .collect::<Vec<_>>();

    let rows = views
        .iter()
        .map(|view| {
            vec![
                String::from(if view.selected { "*" } else { "" }),
                view.watchlist.id.to_string(),
                view.watchlist.name.clone(),
                view.watchlist.instruments.len().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let lines = table(&["", "ID", "NAME", "INSTRUMENTS"], &rows);

    let mut result = CommandResult::ok(serde_json::to_value(&views)?).with_lines(lines);
    if views.is_empty() {
        result = result.with_warning("no watchlists yet; create one with `tickr watchlist create`");
    }
    Ok(result)
}

fn show(manager: &WatchlistManager) -> Result<CommandResult, CliError> {
    let Some(watchlist) = manager.selected() else {
        return Ok(CommandResult::ok(serde_json::Value::Null)
            .with_warning("no watchlists yet; create one with `tickr watchlist create`"));
    };
    let rows = manager.rows(&watchlist.id).unwrap_or_default();

    let mut lines = vec![format!("{} ({})", watchlist.name, watchlist.id)];
    lines.extend(table(
        &["ID", "SYMBOL", "EXCHANGE", "LAST", "REFERENCE", "TYPE", "CHANGE", "CHANGE %"],
        &rows.iter().map(row_cells).collect::<Vec<_>>(),
    ));

    let data = serde_json::to_value(WatchlistRows {
        id: watchlist.id.as_str(),
        name: &watchlist.name,
        rows,
    })?;
    Ok(CommandResult::ok(data).with_lines(lines))
}

fn row_cells(row: &InstrumentRow) -> Vec<String> {
    let instrument = &row.instrument;
    vec![
        instrument.id.to_string(),
        instrument.trading_symbol.to_string(),
        instrument.exchange.to_string(),
        format_price(instrument.exchange, instrument.last_price),
        format_price(instrument.exchange, instrument.reference_price),
        instrument.reference_type.to_string(),
        row.change.format_absolute(instrument.exchange),
        row.change.format_percent(),
    ]
}
