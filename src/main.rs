use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keystep::config::Config;
use keystep::keyboard::display::{ENTER, key_label};
use keystep::session::result::SessionResult;
use keystep::session::text_input::{Attrs, Char, Feedback};
use keystep::session::trace::Trace;
use keystep::store::json_store::JsonStore;
use keystep::store::storage::{LocalStorage, ResultStorage};

#[derive(Parser)]
#[command(name = "keystep", version, about = "Keystroke tracking with typo recovery")]
struct Cli {
    #[arg(long, global = true, help = "Directory for stored results and key stats")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a recorded keystroke trace and summarise it
    Replay {
        trace: PathBuf,
        #[arg(long, help = "Append the result to the local history")]
        save: bool,
        #[arg(long, help = "Print every committed step")]
        show_steps: bool,
    },
    /// List stored session results
    History,
    /// Show accumulated per-key statistics
    Stats,
    /// Delete stored results and key statistics
    Clear,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::load().context("loading config")?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| PathBuf::from(&config.data_dir));
    let store = JsonStore::new(data_dir)?;

    match cli.command {
        Command::Replay {
            trace,
            save,
            show_steps,
        } => replay(&config, &store, &trace, save, show_steps),
        Command::History => history(&store),
        Command::Stats => stats(&store),
        Command::Clear => clear(&store),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn replay(
    config: &Config,
    store: &JsonStore,
    path: &Path,
    save: bool,
    show_steps: bool,
) -> Result<()> {
    let trace = Trace::load(path)?;
    let replay = trace.replay_with(config.settings);

    println!("{}", render_chars(&replay.chars));
    println!();
    println!(
        "events: {} succeeded, {} recovered, {} failed, {} ignored",
        replay.count(Feedback::Succeeded),
        replay.count(Feedback::Recovered),
        replay.count(Feedback::Failed),
        replay.ignored,
    );

    if show_steps {
        for (i, step) in replay.steps.iter().enumerate() {
            let mark = if step.typo { "typo" } else { "" };
            println!(
                "{i:>5} {:>9} {:>8}ms {mark}",
                key_label(step.ch),
                step.time_stamp
            );
        }
    }

    let Some(result) = replay.result(&trace) else {
        println!("nothing was committed");
        return Ok(());
    };
    print_result(&result);

    if save {
        if !replay.completed {
            bail!("refusing to save an incomplete session");
        }
        LocalStorage::new(store.clone()).append(std::slice::from_ref(&result))?;
        let mut key_stats = store.load_key_stats();
        key_stats.stats.set_target_cpm(config.target_cpm());
        key_stats.stats.update_from_histogram(&result.histogram());
        store.save_key_stats(&key_stats)?;
        println!("saved to {}", store.base_dir().display());
    }
    Ok(())
}

fn history(store: &JsonStore) -> Result<()> {
    let results = LocalStorage::new(store.clone()).load()?;
    if results.is_empty() {
        println!("no stored results");
        return Ok(());
    }
    for result in &results {
        println!(
            "{}  {:>4} chars  {:>6.1} wpm  {:>5.1}%  {:>6.1}s",
            result.timestamp.format("%Y-%m-%d %H:%M"),
            result.length,
            result.wpm(),
            result.accuracy,
            result.elapsed_secs(),
        );
    }
    Ok(())
}

fn stats(store: &JsonStore) -> Result<()> {
    let data = store.load_key_stats();
    if data.stats.is_empty() {
        println!("no key statistics yet");
        return Ok(());
    }
    println!(
        "{:>9} {:>6} {:>6} {:>9} {:>10}",
        "key", "hits", "miss%", "time(ms)", "confidence"
    );
    for (&key, stat) in &data.stats.stats {
        println!(
            "{:>9} {:>6} {:>5.1}% {:>9.0} {:>10.2}",
            key_label(key),
            stat.hit_count,
            stat.miss_rate() * 100.0,
            stat.filtered_time_ms,
            stat.confidence,
        );
    }
    Ok(())
}

fn clear(store: &JsonStore) -> Result<()> {
    LocalStorage::new(store.clone()).clear()?;
    store.save_key_stats(&Default::default())?;
    println!("cleared {}", store.base_dir().display());
    Ok(())
}

fn print_result(result: &SessionResult) {
    println!(
        "length {}  errors {}  time {:.1}s  speed {:.1} wpm  accuracy {:.1}%",
        result.length,
        result.errors,
        result.elapsed_secs(),
        result.wpm(),
        result.accuracy,
    );
}

/// Plain text for hits, `[x]` for misses, `{x}` for garbage and `|x` at the
/// cursor.
fn render_chars(chars: &[Char]) -> String {
    let mut out = String::with_capacity(chars.len() * 2);
    for c in chars {
        match c.attrs {
            Attrs::Hit | Attrs::Normal => out.push(c.ch),
            Attrs::Miss if c.ch == ENTER => out.push_str("[\u{21b5}]\n"),
            Attrs::Miss => {
                out.push('[');
                out.push(c.ch);
                out.push(']');
            }
            Attrs::Garbage => {
                out.push('{');
                out.push(c.ch);
                out.push('}');
            }
            Attrs::Cursor => {
                out.push('|');
                out.push(c.ch);
            }
        }
    }
    out
}
