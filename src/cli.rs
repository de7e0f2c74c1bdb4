// SPDX-FileCopyrightText: © 2025 TTKB, LLC
// SPDX-License-Identifier: BSD-3-CLAUSE
use clap::{Args, Parser, Subcommand};
use clap_num::maybe_hex;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use crate::align::{find_gaps, SpanRecord};
use crate::reconcile::{apply_edit_strategy, reconcile, EditStrategy};
use crate::search::all_subs;
use crate::{Error, Params};

/// Fingerprints text fragments so a signal cognized once can be
/// recognized later inside different noise.
#[derive(Debug, Parser)]
#[clap(name = env!("CARGO_CRATE_NAME"), version)]
pub struct App {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: CLICommand,
}

#[derive(Debug, Subcommand)]
enum CLICommand {
    /// Read stdin, emit fingerprints of every interesting substring
    Fingerprint {
        /// Print search counters to stderr
        #[clap(short = 't', long)]
        stats: bool,

        /// Skip printing the fingerprints themselves
        #[clap(short, long)]
        no_prints: bool,

        /// Disable interestingness filtering, emit every fingerprint
        #[clap(short, long)]
        all: bool,

        /// Disable parallelism
        #[clap(short, long)]
        serial: bool,
    },

    /// Read noise from stdin, classify it against an edited signal
    /// buffer and emit the interval map
    Reconcile {
        /// File holding the user-edited signal buffer
        #[clap(long)]
        signal: PathBuf,

        /// Dump a YAML state trace to stderr
        #[clap(short, long)]
        debug: bool,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Output file (default: console)
    #[clap(long, short, global = true)]
    output: Option<PathBuf>,

    /// Fingerprint channel (hex accepted)
    #[clap(long, short, global = true, value_parser = maybe_hex::<u16>, default_value_t = 963)]
    channel: u16,
}

#[derive(Serialize)]
struct DebugTrace<'a> {
    noise: &'a str,
    signal: &'a str,
    intervals: Vec<SpanRecord>,
    strategy: EditStrategy,
    reconciled: String,
}

pub fn main() {
    let args = App::parse();
    std::process::exit(run(args));
}

fn run(args: App) -> i32 {
    let message = match read_stdin() {
        Ok(message) => message,
        Err(code) => return code,
    };

    let mut writer: Box<dyn Write> = match args.global_opts.output {
        Some(ref path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .expect("create output file"),
        None => Box::new(io::stdout()),
    };

    match args.command {
        CLICommand::Fingerprint {
            stats,
            no_prints,
            all,
            serial,
        } => {
            let mut params = if all {
                Params::unfiltered()
            } else {
                Params::default()
            };
            params.channel = args.global_opts.channel;
            if serial {
                params.parallel = false;
            }

            let (prints, search_stats) = match all_subs(message.trim(), &params) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("{e}");
                    return 1;
                }
            };

            if !no_prints {
                let machine = args.global_opts.output.is_some() || !io::stdout().is_terminal();
                if machine {
                    writeln!(
                        writer,
                        "{}",
                        serde_json::to_string_pretty(&prints.to_json()).expect("encode prints")
                    )
                    .expect("write prints");
                } else {
                    write!(writer, "{prints}").expect("write prints");
                }
            }

            if stats {
                eprintln!("{search_stats}");
            }

            0
        }

        CLICommand::Reconcile { signal, debug } => {
            let signal_text = match fs::read(&signal) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        eprintln!("{}: {}", signal.display(), Error::BadEncoding);
                        return 2;
                    }
                },
                Err(e) => {
                    eprintln!("{}: {}", signal.display(), e);
                    return 1;
                }
            };

            let noise = message.trim();
            let signal_text = signal_text.trim();

            let it = find_gaps(signal_text, noise);
            let records: Vec<SpanRecord> = it.iter().map(SpanRecord::from).collect();
            writeln!(
                writer,
                "{}",
                serde_json::to_string_pretty(&records).expect("encode intervals")
            )
            .expect("write intervals");

            if debug {
                let strategy = reconcile(&it);
                let reconciled = apply_edit_strategy(&it, &strategy);
                let trace = DebugTrace {
                    noise,
                    signal: signal_text,
                    intervals: records,
                    strategy,
                    reconciled,
                };
                eprint!("{}", serde_yaml::to_string(&trace).expect("encode trace"));
            }

            0
        }
    }
}

/// Read the whole of stdin, refusing to wait on an interactive
/// terminal with nothing piped in.
fn read_stdin() -> Result<String, i32> {
    let mut stdin = io::stdin();

    if stdin.is_terminal() {
        let call: Vec<String> = std::env::args().collect();
        eprintln!("write a message to stdin like:\n\techo foo | {}", call.join(" "));
        return Err(1);
    }

    let mut bytes = Vec::new();
    if let Err(e) = stdin.read_to_end(&mut bytes) {
        eprintln!("{e}");
        return Err(1);
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(_) => {
            eprintln!("{}", Error::BadEncoding);
            Err(2)
        }
    }
}
