//! ALC Playground CLI - run ALC Lisp programs through a playground session
//!
//! Provides subcommands for running a file once and for an interactive
//! read-run loop.

use alc_playground::interpreter::Node;
use alc_playground::runtime::{RunError, RunReport};
use alc_playground::util::render::object_to_json;
use alc_playground::{PlaygroundConfig, Session};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "alc-playground")]
#[command(about = "Run ALC Lisp programs through the playground bridge", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Append the rendered result of each run to the messages
    #[arg(long, global = true)]
    echo_result: bool,

    /// Maximum nesting of function calls
    #[arg(long, global = true)]
    max_call_depth: Option<usize>,

    /// Maximum bracket nesting accepted by the parser
    #[arg(long, global = true)]
    max_nesting_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file once
    Run {
        /// Source file
        file: PathBuf,

        /// Print the lexed tokens
        #[arg(long)]
        tokens: bool,

        /// Print the parsed AST
        #[arg(long)]
        ast: bool,

        /// Emit a single JSON document instead of text
        #[arg(long)]
        json: bool,
    },

    /// Read-run loop; `.q` quits, `.clear` clears messages
    Repl,
}

fn load_config(cli: &Cli) -> Result<PlaygroundConfig> {
    let mut config = match &cli.config {
        Some(path) => PlaygroundConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => PlaygroundConfig::default(),
    };
    if cli.echo_result {
        config.echo_result = true;
    }
    if let Some(depth) = cli.max_call_depth {
        config.max_call_depth = depth;
    }
    if let Some(depth) = cli.max_nesting_depth {
        config.max_nesting_depth = depth;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Initialize tracing
    let level = if config.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let session = Session::new(config);
    session.initialize().await?;

    match cli.command {
        Commands::Run {
            file,
            tokens,
            ast,
            json,
        } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            run_file(&session, &source, tokens, ast, json)?;
        }
        Commands::Repl => repl(&session)?,
    }

    session.shutdown();
    Ok(())
}

fn run_file(session: &Session, source: &str, tokens: bool, ast: bool, json: bool) -> Result<()> {
    let outcome = session.trigger_run(source);
    let snapshot = session.snapshot();

    if json {
        let mut document = serde_json::json!({
            "messages": snapshot.message_texts(),
        });
        match &outcome {
            Ok(report) => {
                document["report"] = serde_json::to_value(report)?;
                document["result"] = object_to_json(&report.result);
            }
            Err(err) => document["error"] = err.to_string().into(),
        }
        if tokens {
            document["tokens"] = serde_json::to_value(snapshot.tokens())?;
        }
        if ast {
            document["ast"] = serde_json::to_value(snapshot.ast())?;
        }
        println!("{}", serde_json::to_string_pretty(&document)?);
        return outcome.map(|_| ()).map_err(Into::into);
    }

    for message in snapshot.message_texts() {
        println!("{}", message);
    }
    let report = outcome?;
    print_report(&report);

    if tokens {
        for token in snapshot.tokens() {
            println!("  {:>6}  {:<14} {:?}", token.start, format!("{:?}", token.kind), token.value);
        }
    }
    if let Some(tree) = snapshot.ast().filter(|_| ast) {
        print_ast(tree, 1);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("=> {}", report.result);
    println!(
        "   {} tokens, {} nodes, {} prints in {:?}",
        report.token_count, report.node_count, report.print_events, report.elapsed
    );
    if report.observer_failures > 0 {
        eprintln!("   {} observer failures", report.observer_failures);
    }
}

fn print_ast(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Expression(children) | Node::List(children) => {
            println!("{}{}", indent, node.type_of());
            for child in children {
                print_ast(child, depth + 1);
            }
        }
        Node::FunctionLiteral {
            arguments, body, ..
        } => {
            println!("{}{} ({} args)", indent, node.type_of(), arguments.len());
            print_ast(body, depth + 1);
        }
        other => println!("{}{:?}", indent, other),
    }
}

fn repl(session: &Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut shown = 0;

    loop {
        print!("alc> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" => continue,
            ".q" => break,
            ".clear" => {
                session.clear_messages();
                shown = 0;
                println!("messages cleared");
                continue;
            }
            _ => {}
        }

        let outcome = session.trigger_run(&line);
        let snapshot = session.snapshot();
        for message in snapshot.message_texts().iter().skip(shown) {
            println!("{}", message);
        }
        shown = snapshot.messages.len();

        match outcome {
            Ok(report) => println!("=> {}", report.result),
            Err(RunError::Execution(failure)) => println!("error: {}", failure.diagnostic()),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
