//! Fragment replay CLI.
//!
//! # Responsibility
//! - Replay a tree of implementor fragments through a registry bridge.
//! - Print the collector's merged index as JSON on stdout.
//!
//! Arguments are parsed with `clap`; `--log-level` and `--log-dir` fall back
//! to `IMPLBRIDGE_LOG` and `IMPLBRIDGE_LOG_DIR`.

use clap::Parser;
use implbridge_core::{
    core_version, default_log_level, init_logging, load_fragments, replay_into, LoadOrder,
    RegistryBridge, SharedIndex,
};
use log::{error, info};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectorTiming {
    First,
    Last,
}

impl CollectorTiming {
    fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

/// Replays implementor fragments through a registry bridge.
#[derive(Parser, Debug)]
#[command(name = "implbridge_cli", version)]
struct CliArgs {
    /// Root directory of the `implementors/` fragment tree
    #[arg(value_name = "FRAGMENT_ROOT")]
    root: PathBuf,

    /// Register the collector before any fragment loads (default)
    #[arg(long, conflicts_with = "collector_last")]
    collector_first: bool,

    /// Register the collector after every fragment has loaded
    #[arg(long)]
    collector_last: bool,

    /// Load fragments in reverse path order
    #[arg(long)]
    reverse: bool,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "IMPLBRIDGE_LOG", value_name = "LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when unset
    #[arg(long, env = "IMPLBRIDGE_LOG_DIR", value_name = "DIR")]
    log_dir: Option<String>,
}

impl CliArgs {
    fn timing(&self) -> CollectorTiming {
        match (self.collector_first, self.collector_last) {
            (_, true) => CollectorTiming::Last,
            (_, false) => CollectorTiming::First,
        }
    }

    fn order(&self) -> LoadOrder {
        if self.reverse {
            LoadOrder::Reversed
        } else {
            LoadOrder::Sorted
        }
    }
}

fn run(args: CliArgs) -> Result<serde_json::Value, String> {
    let timing = args.timing();
    let order = args.order();
    let fragments = load_fragments(&args.root).map_err(|err| err.to_string())?;
    let fragment_count = fragments.len();
    let index = SharedIndex::new();
    let mut bridge = RegistryBridge::new();

    let register_outcome = match timing {
        CollectorTiming::First => {
            let outcome = bridge.register_collector(index.clone());
            replay_into(&mut bridge, fragments, order);
            outcome
        }
        CollectorTiming::Last => {
            replay_into(&mut bridge, fragments, order);
            bridge.register_collector(index.clone())
        }
    };

    let stats = bridge.stats();
    info!(
        "event=cli_replay module=cli status=ok fragments={} delivered={} dropped={}",
        fragment_count, stats.delivered, stats.dropped
    );

    Ok(json!({
        "version": core_version(),
        "collector": timing.as_str(),
        "fragments": fragment_count,
        "delivered_pending": register_outcome.delivered_pending,
        "stats": {
            "delivered": stats.delivered,
            "buffered": stats.buffered,
            "dropped": stats.dropped,
        },
        "index": index.snapshot(),
    }))
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(err) = init_logging(&level, args.log_dir.as_deref()) {
        eprintln!("implbridge_cli: logging disabled: {err}");
    }

    match run(args).and_then(|report| {
        serde_json::to_string_pretty(&report).map_err(|err| err.to_string())
    }) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_replay module=cli status=error message={err}");
            eprintln!("implbridge_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliArgs, CollectorTiming};
    use clap::Parser;
    use implbridge_core::LoadOrder;

    #[test]
    fn defaults_to_collector_first_sorted() {
        let parsed = CliArgs::try_parse_from(["implbridge_cli", "doc/implementors"])
            .expect("args should parse");
        assert_eq!(parsed.timing(), CollectorTiming::First);
        assert_eq!(parsed.order(), LoadOrder::Sorted);
    }

    #[test]
    fn accepts_timing_and_order_flags() {
        let parsed =
            CliArgs::try_parse_from(["implbridge_cli", "--collector-last", "root", "--reverse"])
                .expect("args should parse");
        assert_eq!(parsed.timing(), CollectorTiming::Last);
        assert_eq!(parsed.order(), LoadOrder::Reversed);
        assert_eq!(parsed.root.to_str(), Some("root"));
    }

    #[test]
    fn rejects_missing_root_unknown_flags_and_conflicting_timing() {
        assert!(CliArgs::try_parse_from(["implbridge_cli"]).is_err());
        assert!(CliArgs::try_parse_from(["implbridge_cli", "root", "--verbose"]).is_err());
        assert!(CliArgs::try_parse_from(["implbridge_cli", "a", "b"]).is_err());
        assert!(CliArgs::try_parse_from([
            "implbridge_cli",
            "root",
            "--collector-first",
            "--collector-last",
        ])
        .is_err());
    }

    #[test]
    fn log_level_flag_is_optional() {
        let parsed = CliArgs::try_parse_from(["implbridge_cli", "root", "--log-level", "warn"])
            .expect("args should parse");
        assert_eq!(parsed.log_level.as_deref(), Some("warn"));
    }
}
