use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use biblion::{build_index, close, open_index, run_query};

#[derive(Parser)]
#[command(name = "biblion", version, about = "Offline boolean/tf-idf search over an author/title corpus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a corpus directory laid out as <author>/<title>.<ext>
    Build {
        #[arg(short, long, value_name = "DIRECTORY")]
        input: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "biblion_index.bin")]
        output: PathBuf,
        #[arg(long, value_name = "MB", default_value_t = 64)]
        memory_mb: usize,
    },
    /// Run a boolean query against a previously built index
    Search {
        #[arg(short, long)]
        query: String,
        #[arg(short, long, value_name = "DIRECTORY")]
        corpus: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "biblion_index.bin")]
        index: PathBuf,
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            memory_mb,
        } => {
            println!("Building index from {}", input.display());
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
            pb.set_message("spilling SPIMI blocks and merging...");
            pb.enable_steady_tick(std::time::Duration::from_millis(120));

            let start = Instant::now();
            let temp_dir = output
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join("biblion_blocks");
            let index_path = build_index(&input, memory_mb, &temp_dir, &output)?;
            let elapsed = start.elapsed();

            pb.finish_with_message(format!("done in {:.2?}", elapsed));
            println!("Index written to {}", index_path.display());
        }
        Commands::Search {
            query,
            corpus,
            index,
            count,
        } => {
            let docs_list = index
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join("docs_list.txt");
            let handle = open_index(&index, &docs_list, &corpus)?;

            let hits = run_query(&handle, &query, count)?;
            if hits.is_empty() {
                println!("No matches for \"{query}\"");
            } else {
                for hit in &hits {
                    println!("{:.4}  {}", hit.score, hit.path.display());
                    if let Some(snippet) = &hit.snippet {
                        println!("    {}", snippet.trim());
                    }
                }
            }
            close(handle);
        }
    }

    Ok(())
}
