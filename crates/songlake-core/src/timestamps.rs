//! Derivation of the event timestamp and its calendar fields.
//!
//! `ts` is milliseconds since the Unix epoch. The derived `start_time` keeps millisecond
//! precision and is interpreted as UTC. Every calendar field is taken from that same value.

use polars::prelude::*;

use crate::schema::start_time_dtype;

/// `ts` (Int64 epoch millis) → `Datetime[ms]`. Nulls stay null.
pub fn start_time_expr(ts: Expr) -> Expr {
    ts.cast(DataType::Int64).cast(start_time_dtype())
}

/// Time dimension fields, all Int32: `hour`, `day`, `week` (ISO week of year), `month`,
/// `year`, `weekday` (ISO, Monday = 1 .. Sunday = 7).
pub fn calendar_columns(start_time: Expr) -> [Expr; 6] {
    [
        start_time.clone().dt().hour().cast(DataType::Int32).alias("hour"),
        start_time.clone().dt().day().cast(DataType::Int32).alias("day"),
        start_time.clone().dt().week().cast(DataType::Int32).alias("week"),
        month_expr(start_time.clone()),
        year_expr(start_time.clone()),
        start_time.dt().weekday().cast(DataType::Int32).alias("weekday"),
    ]
}

pub fn year_expr(start_time: Expr) -> Expr {
    start_time.dt().year().cast(DataType::Int32).alias("year")
}

pub fn month_expr(start_time: Expr) -> Expr {
    start_time.dt().month().cast(DataType::Int32).alias("month")
}
