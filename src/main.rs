//! CLI entry point for aludel
//!
//! Loads a content directory and runs the terminal player.

use aludel::content::{ContentRepository, FsContentRepository};
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "play" => {
            if args.len() < 3 {
                eprintln!("Error: Missing content directory");
                eprintln!();
                print_usage();
                process::exit(1);
            }
            let content_dir = PathBuf::from(&args[2]);
            let save_dir = match args.get(3).map(String::as_str) {
                Some("--saves") => match args.get(4) {
                    Some(dir) => Some(PathBuf::from(dir)),
                    None => {
                        eprintln!("Error: --saves needs a directory");
                        process::exit(1);
                    }
                },
                Some(other) => {
                    eprintln!("Error: Unknown option '{other}'");
                    process::exit(1);
                }
                None => None,
            };
            run_play(content_dir, save_dir).await;
        }
        "--help" | "-h" => {
            print_usage();
        }
        command => {
            eprintln!("Error: Unknown command '{command}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("aludel - Narrative Adventure Engine");
    println!();
    println!("USAGE:");
    println!("    cargo run -- play <content_dir> [--saves <dir>]");
    println!();
    println!("COMMANDS:");
    println!("    play <dir> [--saves <dir>]   Play a content directory in the terminal");
    println!("    --help, -h                   Show this help message");
    println!();
    println!("The content directory holds chapters.json and, optionally, puzzles.json.");
}

async fn run_play(content_dir: PathBuf, save_dir: Option<PathBuf>) {
    let repository = FsContentRepository::new(&content_dir);
    let content = match repository.load_all().await {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error: Failed to load content from '{}'", content_dir.display());
            eprintln!("Reason: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = aludel::cli::play::run_play(content, save_dir.as_deref()) {
        eprintln!("Error: Player mode failed");
        eprintln!("Reason: {err}");
        process::exit(1);
    }
}
