//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `regdesk_core` linkage.
//! - Exercise migrations and id allocation against an in-memory store.
//! - Keep output deterministic for quick local sanity checks.

use regdesk_core::db::open_db_in_memory;
use regdesk_core::{next_sequential, SqliteRegistrationRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("regdesk_core ping={}", regdesk_core::ping());
    println!("regdesk_core version={}", regdesk_core::core_version());

    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("regdesk_core db=error detail={err}");
            return ExitCode::FAILURE;
        }
    };
    let next = SqliteRegistrationRepository::try_new(&conn)
        .and_then(|repo| next_sequential(&repo));
    match next {
        Ok(ids) => {
            println!(
                "regdesk_core next_id={} next_sequence={}",
                ids.id, ids.sequence_number
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("regdesk_core repo=error detail={err}");
            ExitCode::FAILURE
        }
    }
}
