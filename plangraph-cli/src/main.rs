use std::{path::PathBuf, process::ExitCode};

use ariadne::{ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use plangraph::config::PlanGraphConfig;
use planroles::ClosureOptions;

mod commands;
mod error;
mod logger;

use error::{CliError, CliResult};
use logger::TerminalLogger;

/// Goal distances, derived roles and solver answers over state-space fact files
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Configuration file [default: $PLANGRAPH_CONFIG, then the user configuration directory]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Label every state with its shortest distance to a goal state
    Distance {
        /// State-space fact file, `-` for stdin
        input: String,
        /// Output file [default: stdout]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip lines that are not facts instead of failing
        #[arg(long, default_value_t = false)]
        lenient: bool,
    },
    /// Discover derived binary relations and write their value in every state
    Roles {
        /// State-space fact file, `-` for stdin
        input: String,
        /// Output file [default: stdout]
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop discovery after this many definitions (overrides the configuration)
        #[arg(long)]
        max_definitions: Option<usize>,
    },
    /// Extract the last answer set from solver output
    Answer {
        /// Solver output, `-` for stdin
        input: String,
        /// Read the `ANSWER` block of `--outf=1` output instead of the last `Answer:` line
        #[arg(long, default_value_t = false)]
        block: bool,
        /// Rewrite `holds(S, (R, a, b), role)` into `holds(S, ("R_role", a, b))`
        #[arg(long, default_value_t = false)]
        reshape_roles: bool,
        /// Output file [default: stdout]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print counts of states, transitions and facts
    Stats {
        /// Fact file, `-` for stdin
        input: String,
    },
}

fn level_filter(args: &Arguments, config: &PlanGraphConfig) -> LevelFilter {
    match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => config.log.level_filter(),
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

fn run(args: &Arguments, config: &PlanGraphConfig) -> CliResult<()> {
    match &args.command {
        Command::Distance {
            input,
            output,
            lenient,
        } => {
            let text = commands::read_input(input)?;
            let bytes = commands::distance(input, &text, *lenient)?;
            commands::write_output(output.as_deref(), &bytes)
        }
        Command::Roles {
            input,
            output,
            max_definitions,
        } => {
            let mut options = ClosureOptions::from(&config.closure);
            if max_definitions.is_some() {
                options.max_definitions = *max_definitions;
            }
            let text = commands::read_input(input)?;
            let bytes = commands::roles(input, &text, &options)?;
            commands::write_output(output.as_deref(), &bytes)
        }
        Command::Answer {
            input,
            block,
            reshape_roles,
            output,
        } => {
            let text = commands::read_input(input)?;
            let bytes = commands::answer(input, &text, *block, *reshape_roles)?;
            commands::write_output(output.as_deref(), &bytes)
        }
        Command::Stats { input } => {
            let text = commands::read_input(input)?;
            let summary = commands::stats(input, &text)?;
            commands::write_output(None, summary.as_bytes())
        }
    }
}

fn report(error: CliError) {
    match error {
        CliError::Parse { file, text, errors } => {
            let mut colors = ColorGenerator::new();
            let color = colors.next();
            eprintln!("Failed to parse {}:", file);

            for error in errors {
                let span = (file.clone(), error.span.clone());
                let printed = Report::build(ReportKind::Error, span.clone())
                    .with_config(Config::default().with_index_type(IndexType::Byte))
                    .with_message(&error.message)
                    .with_label(
                        Label::new(span)
                            .with_message("The error occurred here")
                            .with_color(color),
                    )
                    .finish()
                    .eprint((file.clone(), Source::from(text.as_str())));
                if printed.is_err() {
                    eprintln!("{}", error);
                }
            }
        }
        other => eprintln!("Error: {}", other),
    }
}

fn main() -> ExitCode {
    let args = Arguments::parse();

    let config = match PlanGraphConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = TerminalLogger::new(level_filter(&args, &config)).install() {
        eprintln!("Logger unavailable: {}", error);
    }

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(error);
            ExitCode::FAILURE
        }
    }
}
