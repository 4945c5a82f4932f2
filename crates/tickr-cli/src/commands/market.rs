use std::time::Duration;

use serde::Serialize;
use tickr_core::{MarketIndex, MarketStatusPoller, MarketStatusState, PriceChange};
use tracing::info;

use crate::cli::{Cli, MarketArgs, MarketCommand};
use crate::error::CliError;
use crate::output::{table, ReportError};

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexView<'a> {
    #[serde(flatten)]
    index: &'a MarketIndex,
    change: PriceChange,
}

pub async fn run(context: &Context, args: &MarketArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    context.require_login()?;
    match &args.command {
        MarketCommand::Indices => indices(context).await,
        MarketCommand::Status {
            watch,
            interval_secs,
        } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(context.config.market_poll_interval);
            if *watch {
                watch_status(context, interval, cli.pretty).await
            } else {
                let status = context.gateway.market_status().await?;
                let label = if status.open { "open" } else { "closed" };
                Ok(CommandResult::ok(serde_json::to_value(status)?)
                    .with_lines(vec![format!("Market is {label}")]))
            }
        }
    }
}

async fn indices(context: &Context) -> Result<CommandResult, CliError> {
    let indices = context.gateway.market_indices().await?;
    let views = indices
        .iter()
        .map(|index| IndexView {
            index,
            change: index.change(),
        })
        .collect::<Vec<_>>();

    let rows = views
        .iter()
        .map(|view| {
            vec![
                view.index.instrument_name.clone(),
                format!("{:.2}", view.index.last_price),
                format!("{:.2}", view.index.close),
                signed(view.change.absolute),
                view.change.format_percent(),
            ]
        })
        .collect::<Vec<_>>();
    let lines = table(&["INDEX", "LAST", "PREV CLOSE", "CHANGE", "CHANGE %"], &rows);

    Ok(CommandResult::ok(serde_json::to_value(&views)?).with_lines(lines))
}

/// Polls until Ctrl-C, printing every published state as JSON.
async fn watch_status(
    context: &Context,
    interval: Duration,
    pretty: bool,
) -> Result<CommandResult, CliError> {
    let mut handle = MarketStatusPoller::new(context.gateway.clone())
        .with_interval(interval)
        .spawn();
    let mut last = MarketStatusState::default();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("stopping market status watch");
                break;
            }
            state = handle.changed() => {
                let Some(state) = state else { break };
                let line = if pretty {
                    serde_json::to_string_pretty(&state)?
                } else {
                    serde_json::to_string(&state)?
                };
                println!("{line}");
                last = state;
            }
        }
    }
    handle.shutdown().await;

    let errors = last
        .error
        .iter()
        .map(|message| ReportError::new("gateway.unavailable", message.clone()))
        .collect();
    let label = last
        .status
        .map(|status| if status.open { "open" } else { "closed" })
        .unwrap_or("unknown");
    Ok(CommandResult::ok(serde_json::to_value(&last)?)
        .with_errors(errors)
        .with_lines(vec![format!("Last known market status: {label}")]))
}

fn signed(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    format!("{sign}{:.2}", value.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_change_has_explicit_sign() {
        assert_eq!(signed(156.4), "+156.40");
        assert_eq!(signed(-234.15), "-234.15");
        assert_eq!(signed(0.0), "+0.00");
    }

    #[test]
    fn index_view_flattens_with_change() {
        let index = MarketIndex {
            instrument_name: String::from("NIFTY 50"),
            exchange: String::from("NSE"),
            last_price: 110.0,
            open: 100.0,
            high: 111.0,
            low: 99.0,
            close: 100.0,
        };
        let value = serde_json::to_value(IndexView {
            index: &index,
            change: index.change(),
        })
        .expect("serialize");
        assert_eq!(value["instrumentName"], "NIFTY 50");
        assert_eq!(value["change"]["percent"], 10.0);
    }
}
