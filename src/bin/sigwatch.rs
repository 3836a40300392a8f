//! Print captured signals while a ticker runs.
//!
//! ```text
//! sigwatch --signal USR1 --signal HUP --ticks 20 --interval-ms 500
//! kill -USR1 <pid>
//! ```

use std::{cell::Cell, rc::Rc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use posix_rt::{
    config::Config,
    signal,
    task::{self, Executor, Task},
};

#[derive(Parser)]
#[command(name = "sigwatch")]
#[command(about = "Report signals delivered to this process.", long_about = None)]
struct Args {
    /// Signal to capture, by name (USR1, SIGHUP) or number. Repeatable.
    #[arg(short, long = "signal", value_name = "SIG", default_value = "USR1")]
    signals: Vec<String>,

    /// Stop after this many ticks.
    #[arg(long, default_value_t = 10)]
    ticks: u32,

    /// Milliseconds between ticks.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

fn report(sig: u32) {
    println!("sigwatch: caught {} ({})", signal::signal_name(sig), sig);
}

/// Resolve a `--signal` argument to a number the runtime can capture.
fn watch_signal(name: &str) -> Result<u32> {
    let Some(sig) = signal::parse_signal(name) else {
        bail!("unknown signal {:?}", name);
    };
    if sig == 0 || sig >= signal::MAX_SIGNALS {
        bail!(
            "signal {} out of range, expected 1..{}",
            sig,
            signal::MAX_SIGNALS - 1
        );
    }
    Ok(sig)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_env();
    posix_rt::init(&config).context("runtime init")?;

    let mut watched = Vec::new();
    for name in &args.signals {
        let sig = watch_signal(name)?;
        signal::enable(sig).with_context(|| format!("cannot capture {}", name))?;
        watched.push(sig);
    }
    println!(
        "sigwatch: pid {} watching {}",
        std::process::id(),
        watched
            .iter()
            .map(|&sig| signal::signal_name(sig))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let done = Rc::new(Cell::new(false));
    let received = Rc::new(Cell::new(0u32));
    let mut executor = Executor::with_capacity(config.task_capacity);

    {
        let done = Rc::clone(&done);
        let ticks = args.ticks;
        let interval = Duration::from_millis(args.interval_ms);
        executor.spawn(Task::new(async move {
            for tick in 1..=ticks {
                task::sleep(interval).await;
                log::debug!("tick {}/{}", tick, ticks);
            }
            done.set(true);
            // Unblock the consumer so the executor can finish
            let _ = signal::raise(signal::SIGWINCH);
        }))?;
    }

    {
        let done = Rc::clone(&done);
        let received = Rc::clone(&received);
        let wake_sig = signal::SIGWINCH;
        signal::enable(wake_sig)?;
        executor.spawn(Task::new(async move {
            while !done.get() {
                let sig = signal::recv().await;
                if done.get() && sig == wake_sig {
                    break;
                }
                received.set(received.get() + 1);
                report(sig);
            }
            while let Some(sig) = signal::try_recv() {
                received.set(received.get() + 1);
                report(sig);
            }
        }))?;
    }

    executor.run();
    println!("sigwatch: {} signal(s) in {} tick(s)", received.get(), args.ticks);
    Ok(())
}
