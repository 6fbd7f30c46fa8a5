use anyhow::Result;
use clap::Parser;

use cur2sheet::cli::Args;
use cur2sheet::report;

fn run(args: &Args) -> Result<()> {
    let json = if args.folder {
        serde_json::to_string(&report::convert_folder(&args.path))?
    } else {
        serde_json::to_string(&report::convert_file(&args.path))?
    };
    println!("{json}");
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
