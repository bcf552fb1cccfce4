// CLI harness: reads an event log, drives the parser and book, and prints
// the throughput summary line (spec.md §6's "reference harness", [ADD 4.9]
// — component C5). Mirrors `original_source/src/pybook.py`'s `main()`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;

use clap::Parser;
use common::logging::{LogLevel, Logger};
use common::{log_info, OrderId};

use orderbook::{Book, Event};

/// Limit order book event-log harness.
#[derive(Parser, Debug)]
#[command(name = "lob-bench")]
#[command(about = "Drives a limit order book from an event log")]
struct Args {
    /// Event log to read; reads stdin if omitted.
    #[arg(long)]
    input: Option<String>,

    /// Print the final best bid/ask after end-of-stream.
    #[arg(long)]
    best: bool,

    /// Run the debug validator after every event, even in a release build.
    #[arg(long)]
    validate: bool,
}

fn main() {
    let args = Args::parse();
    let logger = Logger::with_level(LogLevel::Info);
    log_info!(logger, "lob-bench starting");

    let lines: Box<dyn Iterator<Item = io::Result<String>>> = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file).lines()),
            Err(err) => {
                eprintln!("failed to open {path}: {err}");
                process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin()).lines()),
    };

    let mut book = Book::new();
    let mut order_ids: HashMap<Box<str>, OrderId> = HashMap::new();
    let mut next_order_id: OrderId = 1;
    let mut count: u64 = 0;

    let start = common::time::now_nanos();

    for (index, line) in lines.enumerate() {
        let line_no = index + 1;
        let text = match line {
            Ok(text) => text,
            Err(err) => {
                eprintln!("line {line_no}: {err}");
                process::exit(1);
            }
        };
        if text.trim().is_empty() {
            continue;
        }

        let event = match orderbook::parse_line(line_no, &text) {
            Ok(event) => event,
            Err(err) => {
                eprintln!("line {line_no}: {err} ({text})");
                process::exit(1);
            }
        };

        let result = match event {
            Event::Add { timestamp, uid, is_bid, price, shares } => {
                let order_id = *order_ids.entry(uid).or_insert_with(|| {
                    let id = next_order_id;
                    next_order_id += 1;
                    id
                });
                book.add_order(order_id, timestamp, shares, price, is_bid)
            }
            Event::Reduce { uid, shares, .. } => match order_ids.get(&uid) {
                // An unrecognized uid is the same race artifact the core
                // itself treats as a silent no-op (spec.md §4.7/§7).
                Some(&order_id) => book.reduce_order(order_id, shares),
                None => Ok(()),
            },
        };

        if let Err(err) = result {
            eprintln!("line {line_no}: {err}");
            process::exit(1);
        }

        if args.validate {
            if let Err(violation) = orderbook::debug_validate(&book) {
                eprintln!("line {line_no}: invariant violated: {violation}");
                process::exit(1);
            }
        }

        count += 1;
    }

    let elapsed_secs = common::time::nanos_since(start) as f64 / 1_000_000_000.0;
    let tx_per_sec = if elapsed_secs > 0.0 {
        count as f64 / elapsed_secs
    } else {
        0.0
    };
    println!(
        "Processed {count} transactions in {elapsed_secs:.2} seconds, for an average of {tx_per_sec:.0} transactions/second"
    );

    if args.best {
        println!("best_bid={:?} best_ask={:?}", book.best_bid(), book.best_ask());
    }

    log_info!(logger, "lob-bench finished");
}
