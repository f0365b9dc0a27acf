use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use direct_dfa::parser::postfix_tokens;
use direct_dfa::{DirectDFA, MinimizedDFA, SyntaxTree};

#[derive(Parser)]
#[command(name = "direct-dfa", version)]
#[command(about = "Compile regexes into minimal DFAs via the direct followpos construction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the postfix form, the followpos table and both transition tables
    Inspect {
        /// Pattern to compile
        pattern: String,
    },
    /// Run inputs through the direct and the minimized automaton
    Match {
        /// Pattern to compile
        pattern: String,
        /// Input strings, one verdict each
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Print a Graphviz rendering of one compilation stage
    Dot {
        /// Pattern to compile
        pattern: String,
        /// Stage to render
        #[arg(long, value_enum, default_value = "minimized")]
        stage: Stage,
    },
    /// Compile every non-empty line of a file, "-" reads stdin
    Check {
        /// File of patterns, one per line
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Tree,
    Dfa,
    Minimized,
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { pattern } => inspect(&pattern),
        Command::Match { pattern, inputs } => run_match(&pattern, &inputs),
        Command::Dot { pattern, stage } => dot(&pattern, stage),
        Command::Check { path } => check(&path),
    }
}

fn fail(error: &direct_dfa::Error) -> ! {
    eprintln!("error: {error}");
    process::exit(1);
}

fn inspect(pattern: &str) {
    let tokens = postfix_tokens(pattern).unwrap_or_else(|e| fail(&e));
    let tree = SyntaxTree::from_postfix(&tokens).unwrap_or_else(|e| fail(&e));
    let dfa = DirectDFA::from_syntax_tree(&tree);

    let postfix = tokens
        .iter()
        .map(|token| token.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!("pattern:  {pattern}");
    println!("postfix:  {postfix}");
    println!("followpos:");
    for position in 1..=tree.position_count() {
        let Some(symbol) = tree.symbol_at(position) else {
            continue;
        };
        let followers = tree
            .followpos(position)
            .map(|set| {
                set.iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!("  {position} ({symbol}): {{{followers}}}");
    }
    print!("{dfa}");
    print!("{}", dfa.minimize());
}

fn run_match(pattern: &str, inputs: &[String]) {
    let dfa = DirectDFA::new(pattern).unwrap_or_else(|e| fail(&e));
    let min = dfa.minimize();
    let mut rejected = 0;
    for input in inputs {
        let direct = dfa.accepts(input);
        let minimized = min.accepts(input);
        println!(
            "{input}: direct {}, minimized {}",
            verdict(direct),
            verdict(minimized)
        );
        if !minimized {
            rejected += 1;
        }
    }
    if rejected > 0 {
        process::exit(1);
    }
}

fn verdict(accepted: bool) -> &'static str {
    if accepted {
        "accept"
    } else {
        "reject"
    }
}

fn dot(pattern: &str, stage: Stage) {
    let rendered = match stage {
        Stage::Tree => postfix_tokens(pattern)
            .and_then(|tokens| SyntaxTree::from_postfix(&tokens))
            .map(|tree| tree.to_dot()),
        Stage::Dfa => DirectDFA::new(pattern).map(|dfa| dfa.to_dot()),
        Stage::Minimized => MinimizedDFA::new(pattern).map(|min| min.to_dot()),
    };
    print!("{}", rendered.unwrap_or_else(|e| fail(&e)));
}

fn check(path: &Path) {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
            eprintln!("error: cannot read stdin: {e}");
            process::exit(1);
        });
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("error: cannot read {}: {e}", path.display());
            process::exit(1);
        })
    };

    let mut failures = 0;
    for (index, line) in text.lines().enumerate() {
        let pattern = line.trim();
        if pattern.is_empty() {
            continue;
        }
        match MinimizedDFA::new(pattern) {
            Ok(min) => println!("line {}: ok, {} states", index + 1, min.block_count()),
            Err(e) => {
                eprintln!("line {}: {pattern}: {e}", index + 1);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        process::exit(1);
    }
}
