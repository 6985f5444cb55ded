mod build_info;
mod cli;
mod logging;
mod state;
mod workspace;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Init, List, Roots, Version};

command_enum! {
    (Init, Init),
    (List, List),
    (Roots, Roots),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guards = logging::init_logging(args.log_level, args.log_dir.as_deref());

    let ctx = cli::op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered log lines before exiting
    drop(guards);
    std::process::exit(code);
}
