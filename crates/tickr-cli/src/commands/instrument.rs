use tickr_core::{InstrumentRow, InstrumentSpec, ReferenceType, ValidationError};

use crate::cli::{AddInstrumentArgs, InstrumentArgs, InstrumentCommand, ReferenceArg};
use crate::error::CliError;

use super::{find_watchlist, CommandResult, Context};

pub async fn run(context: &Context, args: &InstrumentArgs) -> Result<CommandResult, CliError> {
    match &args.command {
        InstrumentCommand::Add(args) => add(context, args).await,
        InstrumentCommand::Remove {
            watchlist,
            instrument,
        } => remove(context, watchlist, instrument).await,
    }
}

async fn add(context: &Context, args: &AddInstrumentArgs) -> Result<CommandResult, CliError> {
    let reference_type = match args.reference {
        ReferenceArg::Market => ReferenceType::Market,
        ReferenceArg::Custom => ReferenceType::Custom,
    };
    // Form errors surface before any backend call.
    let spec = InstrumentSpec::parse(&args.symbol, reference_type, args.price.as_deref())?;

    let mut manager = context.watchlists().await?;
    let watchlist_id = find_watchlist(&manager, &args.watchlist)?.id.clone();
    let added = manager.add_instrument(&watchlist_id, &spec).await?;

    let row = InstrumentRow::new(&added);
    let lines = vec![format!(
        "Added {} ({}) at reference {} [{}], change {} / {}",
        added.trading_symbol,
        added.exchange,
        added.reference_price,
        added.reference_type,
        row.change.format_absolute(added.exchange),
        row.change.format_percent(),
    )];
    Ok(CommandResult::ok(serde_json::to_value(&row)?).with_lines(lines))
}

async fn remove(
    context: &Context,
    watchlist: &str,
    instrument: &str,
) -> Result<CommandResult, CliError> {
    let mut manager = context.watchlists().await?;
    let target = find_watchlist(&manager, watchlist)?;
    let watchlist_id = target.id.clone();
    let found = target
        .instruments
        .iter()
        .find(|candidate| {
            candidate.id.as_str() == instrument
                || candidate
                    .trading_symbol
                    .as_str()
                    .eq_ignore_ascii_case(instrument)
        })
        .cloned()
        .ok_or_else(|| ValidationError::UnknownInstrument {
            id: instrument.to_owned(),
            watchlist_id: watchlist_id.to_string(),
        })?;

    manager.remove_instrument(&watchlist_id, &found.id).await?;

    let data = serde_json::json!({
        "watchlistId": watchlist_id,
        "removed": found,
    });
    let lines = vec![format!("Removed {} from {}", found.trading_symbol, watchlist_id)];
    Ok(CommandResult::ok(data).with_lines(lines))
}
