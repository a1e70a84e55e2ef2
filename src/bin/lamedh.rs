// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line interface for reducing and evaluating lambda terms

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lamedh::evaluator::DEFAULT_MAX_STEPS;
use lamedh::{EvalConfig, Evaluator, ExprArena, LambdaError, NodeId, RedexOrder, Strategy, parse};
use std::fs;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(name = "lamedh")]
#[command(about = "Reduce and evaluate untyped lambda calculus terms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read the term from this file instead of the argument (use '-' for stdin)
    #[arg(short, long, global = true)]
    file: Option<String>,

    /// Maximum number of reduction or evaluation steps
    #[arg(short, long, global = true, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Print every step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print the result
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a term and print its canonical rendering
    Parse {
        /// Term to parse
        term: Option<String>,
    },
    /// List the redexes of a term
    Redexes {
        /// Term to inspect
        term: Option<String>,
        /// Enumeration order
        #[arg(short, long, value_enum, default_value_t = OrderArg::Outermost)]
        order: OrderArg,
    },
    /// Reduce the outermost redex until the term is an abstraction
    Canonical {
        /// Term to reduce
        term: Option<String>,
    },
    /// Reduce until no redex is left
    NormalForm {
        /// Term to reduce
        term: Option<String>,
    },
    /// Evaluate a term recursively
    Eval {
        /// Term to evaluate
        term: Option<String>,
        /// Evaluation strategy
        #[arg(short, long, value_enum, default_value_t = StrategyArg::Normal)]
        strategy: StrategyArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Outermost,
    Innermost,
}

impl From<OrderArg> for RedexOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Outermost => RedexOrder::OutermostFirst,
            OrderArg::Innermost => RedexOrder::InnermostFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Normal,
    Eager,
}

impl From<StrategyArg> for Strategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Normal => Strategy::Normal,
            StrategyArg::Eager => Strategy::Eager,
        }
    }
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    let evaluator = Evaluator::new(
        EvalConfig::default()
            .with_max_steps(cli.max_steps)
            .with_verbose(cli.verbose),
    );

    match &cli.command {
        Commands::Parse { term } => {
            let (arena, root) = load(&cli, term.as_deref());
            report(&cli, "Term", &arena, root);
        }
        Commands::Redexes { term, order } => {
            let (arena, root) = load(&cli, term.as_deref());
            let redexes = arena.find_redexes(root, (*order).into());
            if !cli.quiet {
                eprintln!("{} {} redexes", "✓".green(), redexes.len());
            }
            for redex in redexes {
                println!("{}", arena.display(redex));
            }
        }
        Commands::Canonical { term } => {
            let (mut arena, root) = load(&cli, term.as_deref());
            let result = evaluator.goto_canonical(&mut arena, root);
            finish(&cli, "Canonical form", &arena, result);
        }
        Commands::NormalForm { term } => {
            let (mut arena, root) = load(&cli, term.as_deref());
            let result = evaluator.goto_normal_form(&mut arena, root);
            finish(&cli, "Normal form", &arena, result);
        }
        Commands::Eval { term, strategy } => {
            let (mut arena, root) = load(&cli, term.as_deref());
            let strategy = Strategy::from(*strategy);
            let result = evaluator.eval(&mut arena, root, strategy);
            finish(&cli, &format!("Value ({strategy})"), &arena, result);
        }
    }
}

/// Read the term text from the argument, `--file` or stdin and parse it
fn load(cli: &Cli, term: Option<&str>) -> (ExprArena, NodeId) {
    let source = match (term, cli.file.as_deref()) {
        (Some(text), _) => text.to_string(),
        (None, Some(filename)) if filename != "-" => match fs::read_to_string(filename) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("{} reading file '{filename}': {e}", "Error".red().bold());
                process::exit(1);
            }
        },
        (None, _) => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("{} reading from stdin: {e}", "Error".red().bold());
                process::exit(1);
            }
            buffer
        }
    };

    match parse(&source) {
        Ok(parsed) => parsed,
        Err(e) => fail(&LambdaError::from(e)),
    }
}

fn finish(cli: &Cli, label: &str, arena: &ExprArena, result: lamedh::Result<NodeId>) {
    match result {
        Ok(node) => report(cli, label, arena, node),
        Err(e) => fail(&e),
    }
}

fn report(cli: &Cli, label: &str, arena: &ExprArena, node: NodeId) {
    if !cli.quiet {
        eprintln!("{} {label}:", "✓".green());
    }
    println!("{}", arena.display(node));
}

fn fail(error: &LambdaError) -> ! {
    eprintln!("{} {}: {error}", "✗".red(), error.kind().bold());
    process::exit(1);
}
