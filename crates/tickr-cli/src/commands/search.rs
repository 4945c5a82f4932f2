use serde::Serialize;
use tickr_core::{format_price, InstrumentSearch, InstrumentSummary};

use crate::cli::SearchArgs;
use crate::error::CliError;
use crate::output::{table, ReportError};

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponseData<'a> {
    query: &'a str,
    total_elements: usize,
    results: &'a [InstrumentSummary],
}

pub async fn run(context: &Context, args: &SearchArgs) -> Result<CommandResult, CliError> {
    context.require_login()?;

    let mut config = context.config.search;
    if let Some(limit) = args.limit {
        config.page_size = limit.max(1);
    }
    let mut search = InstrumentSearch::new(context.gateway.clone(), config);
    search.set_input(args.query.trim());

    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    if search.is_searchable() {
        if let Err(error) = search.settle().await {
            errors.push(ReportError::new(error.code(), error.message()));
        }
    } else {
        warnings.push(format!(
            "query must be at least {} characters; nothing was searched",
            config.min_query_len
        ));
    }

    let data = serde_json::to_value(SearchResponseData {
        query: search.input(),
        total_elements: search.total_elements(),
        results: search.results(),
    })?;
    let rows = search
        .results()
        .iter()
        .map(|hit| {
            vec![
                hit.trading_symbol.to_string(),
                hit.exchange.to_string(),
                format_price(hit.exchange, hit.last_price),
                hit.name.clone(),
            ]
        })
        .collect::<Vec<_>>();

    let mut result = CommandResult::ok(data)
        .with_errors(errors)
        .with_lines(table(&["SYMBOL", "EXCHANGE", "LAST", "NAME"], &rows));
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}
