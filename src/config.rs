use std::{env, str::FromStr};

use minesweeper_common::models::{
    MAX_BOARD_SIZE, MAX_TIME_LIMIT_SECS, MIN_BOARD_SIZE, RoundParams,
};
use tracing::{debug, warn};

use crate::{GameError, Result};

/// Checks the bounds a new round must satisfy.
pub fn validate_params(params: &RoundParams) -> Result<()> {
    for (name, size) in [("rows", params.rows), ("columns", params.columns)] {
        if !(MIN_BOARD_SIZE..MAX_BOARD_SIZE).contains(&size) {
            return Err(GameError::InvalidConfiguration(format!(
                "{name} must be in [{MIN_BOARD_SIZE}, {MAX_BOARD_SIZE}), got {size}"
            )));
        }
    }

    let max_mines = params.total_cells() / 2;
    if !(1..max_mines).contains(&params.mines) {
        return Err(GameError::InvalidConfiguration(format!(
            "mines must be in [1, {max_mines}) for a {}x{} board, got {}",
            params.rows, params.columns, params.mines
        )));
    }

    if params.time_limit_secs >= MAX_TIME_LIMIT_SECS {
        return Err(GameError::InvalidConfiguration(format!(
            "time limit must be below {MAX_TIME_LIMIT_SECS}s, got {}",
            params.time_limit_secs
        )));
    }

    Ok(())
}

/// Round parameters from `MINESWEEPER_*` variables, defaulting field by field.
pub fn params_from_env() -> Result<RoundParams> {
    let defaults = RoundParams::default();

    let params = RoundParams {
        rows: env_or("MINESWEEPER_ROWS", defaults.rows),
        columns: env_or("MINESWEEPER_COLUMNS", defaults.columns),
        mines: env_or("MINESWEEPER_MINES", defaults.mines),
        time_limit_secs: env_or("MINESWEEPER_TIME_LIMIT", defaults.time_limit_secs),
    };

    debug!(
        "Round parameters from environment: {}x{} with {} mines, {}s limit",
        params.rows, params.columns, params.mines, params.time_limit_secs
    );

    validate_params(&params)?;
    Ok(params)
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}", key, value);
            default
        }),
        Err(_) => default,
    }
}

/// Parses the four text fields of a "new round" form.
///
/// An empty time limit means no countdown.
pub fn parse_params(rows: &str, columns: &str, mines: &str, time_limit: &str) -> Result<RoundParams> {
    let time_limit = time_limit.trim();
    let params = RoundParams {
        rows: parse_field("rows", rows)?,
        columns: parse_field("columns", columns)?,
        mines: parse_field("mines", mines)?,
        time_limit_secs: if time_limit.is_empty() {
            0
        } else {
            parse_field("time limit", time_limit)?
        },
    };

    validate_params(&params)?;
    Ok(params)
}

fn parse_field<T: FromStr>(name: &str, input: &str) -> Result<T> {
    input.trim().parse().map_err(|_| {
        GameError::InvalidConfiguration(format!("{name} is not a number: {input:?}"))
    })
}
