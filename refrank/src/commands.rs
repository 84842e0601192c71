use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("refrank")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("refrank")
        .subcommand_required(true)
        .subcommand(
            command!("rank")
                .about(
                    "Rank every publication in a citation table by how broadly it is \
                cited across pages (bipartite degree centrality)",
                )
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("Path to the citation CSV (page_title,page_id,pub_id_type,pub_id_value)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-l --"limit" <N>)
                        .required(false)
                        .help("Show only the top N publications")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("recommend")
                .about(
                    "Recommend publications related to a seed publication via \
                co-citation and shared categories",
                )
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("Path to the citation CSV (page_title,page_id,pub_id_type,pub_id_value)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-t --"id-type" <TYPE>)
                        .required(true)
                        .help("Seed publication id scheme (doi, arxiv, isbn, pmid)"),
                )
                .arg(
                    arg!(-p --"id" <VALUE>)
                        .required(true)
                        .help("Seed publication id value"),
                )
                .arg(
                    arg!(-n --"count" <N>)
                        .required(false)
                        .help("Number of recommendations to aim for")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-w --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' for metadata lookups.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("8"),
                )
                .arg(
                    arg!(--"merge-by" <KEY>)
                        .required(false)
                        .help("How near-duplicate candidates merge: prefix (first 10 title chars), title, id")
                        .value_parser(["prefix", "title", "id"])
                        .default_value("prefix"),
                )
                .arg(
                    arg!(--"wiki-base" <URL>)
                        .required(false)
                        .help("Base URL of the wiki used for category expansion")
                        .value_parser(clap::value_parser!(url::Url))
                        .default_value("https://en.wikipedia.org"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
