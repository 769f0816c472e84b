pub mod activity;
pub mod attendance;
pub mod member;
pub mod office;
pub mod rule;
pub mod schedule;
pub mod stats;
pub mod status;

use anyhow::Result;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
