//! `deltasol watch` -- poll on an interval and print every snapshot.

use std::time::Duration;

use owo_colors::OwoColorize;

use deltasol_core::{Controller, CoordinatorHandle, UpdateState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::read;

pub async fn handle(
    controller: &Controller,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let interval = args
        .interval
        .map_or(controller.config().scan_interval, Duration::from_secs);
    let color = output::should_color(&global.color);

    let handle = CoordinatorHandle::spawn(controller.clone(), interval);
    let mut rx = handle.subscribe();
    let mut shown: u32 = 0;

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                print_state(&state, &args, global, color);

                shown += 1;
                if args.count.is_some_and(|limit| shown >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn print_state(state: &UpdateState, args: &WatchArgs, global: &GlobalOpts, color: bool) {
    if let Some(ref err) = state.last_error {
        let msg = format!("update failed: {err}");
        if color {
            eprintln!("{}", msg.yellow());
        } else {
            eprintln!("{msg}");
        }
    }

    // Entities are unavailable until the next successful cycle
    if !state.last_update_success {
        return;
    }
    let Some(ref snapshot) = state.snapshot else {
        return;
    };

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        let stamp = snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        println!(
            "{} {}",
            output::heading(&snapshot.device.title(), color),
            output::dim(&stamp, color)
        );
    }
    output::print_output(&read::render(snapshot, &args.read, global), global.quiet);
}
