use std::collections::HashMap;
use std::fs;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;
use simbio::import::parse_mathml;
use simbio::Expr;

/// translates a MathML expression and optionally evaluates it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input filename
    input: String,

    /// Value for an identifier, as name=value (repeatable)
    #[arg(short, long = "bind", value_parser = parse_binding)]
    bind: Vec<(String, f64)>,

    /// Evaluate the expression under the given bindings
    #[arg(short, long)]
    eval: bool,
}

fn parse_binding(text: &str) -> Result<(String, f64)> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got {}", text))?;
    let value = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}", name))?;
    Ok((name.trim().to_string(), value))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Args::parse();
    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("cannot read {}", cli.input))?;
    let expr = parse_mathml(&text)?;
    println!("{}", expr);

    if cli.eval {
        let bindings: HashMap<String, Expr> = cli
            .bind
            .iter()
            .map(|(name, value)| (name.clone(), Expr::Number(*value)))
            .collect();
        info!("evaluating with {} bindings", bindings.len());
        let value = expr.bind_symbols(&bindings).eval(&|id| {
            Err(simbio::ModelError::evaluation(format!("unexpected node {}", id)))
        })?;
        println!("{}", value);
    }
    Ok(())
}
