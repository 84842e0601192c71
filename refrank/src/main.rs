use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use refrank_core::{Expander, MergeKey, PubId, RefGraph, load_citations};
use refrank_scraper::WikiClient;
use std::path::PathBuf;
use std::time::Duration;

mod commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();

    let outcome = match chosen_command.subcommand() {
        Some(("rank", args)) => handle_rank(args),
        Some(("recommend", args)) => handle_recommend(args).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_graph(args: &ArgMatches) -> anyhow::Result<RefGraph> {
    let input = args
        .get_one::<PathBuf>("input")
        .expect("clap marks --input as required");
    let rows = load_citations(input)
        .with_context(|| format!("failed to load citation table {}", input.display()))?;
    let graph = RefGraph::from_rows(&rows)?;
    Ok(graph)
}

fn handle_rank(args: &ArgMatches) -> anyhow::Result<()> {
    let graph = load_graph(args)?;
    let ranked = graph.rank_publications();

    let limit = args
        .get_one::<usize>("limit")
        .copied()
        .unwrap_or(ranked.len())
        .min(ranked.len());

    match args.get_one::<String>("format").map(String::as_str) {
        Some("json") => println!("{}", serde_json::to_string_pretty(&ranked[..limit])?),
        _ => {
            println!(
                "{}",
                format!(
                    "  {} pages, {} publications, {} citations",
                    graph.page_count(),
                    graph.publication_count(),
                    graph.citation_count()
                )
                .bright_black()
            );
            println!("{}", "  centrality  citations  publication".bold());
            for entry in &ranked[..limit] {
                println!(
                    "  {:>10.4}  {:>9}  {}",
                    entry.centrality,
                    entry.citations,
                    entry.id.to_string().bright_white()
                );
            }
        }
    }
    Ok(())
}

async fn handle_recommend(args: &ArgMatches) -> anyhow::Result<()> {
    let graph = load_graph(args)?;

    let id_type = args.get_one::<String>("id-type").expect("required");
    let id_value = args.get_one::<String>("id").expect("required");
    let seed = PubId::new(id_type.clone(), id_value.clone());

    let count = *args.get_one::<usize>("count").expect("has default");
    let workers = *args.get_one::<usize>("workers").expect("has default");
    let merge_key = match args.get_one::<String>("merge-by").map(String::as_str) {
        Some("title") => MergeKey::FullTitle,
        Some("id") => MergeKey::Identifier,
        _ => MergeKey::TitlePrefix(10),
    };
    let wiki_base = args.get_one::<url::Url>("wiki-base").expect("has default");

    let client = WikiClient::new().with_wiki_base(wiki_base.as_str());
    let expander = Expander::new(&graph, client)
        .with_workers(workers)
        .with_merge_key(merge_key);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Expanding citation neighborhood of {seed}..."));

    let result = expander.find_most_relevant(&seed, count).await;
    spinner.finish_and_clear();

    let recommendations = result?;

    match args.get_one::<String>("format").map(String::as_str) {
        Some("json") => println!("{}", serde_json::to_string_pretty(&recommendations)?),
        _ => {
            if recommendations.is_empty() {
                println!("{}", "No related publications found.".yellow());
                return Ok(());
            }
            for rec in &recommendations {
                println!("{} {}", "Rank:".bold(), rec.rank);
                println!("Citations: {}", rec.citations);
                println!("ID: {}", rec.id.to_string().bright_white());
                println!("Source: {}", rec.source_link);
                println!("Title: {}\n", rec.title.as_str().cyan());
            }
        }
    }
    Ok(())
}
