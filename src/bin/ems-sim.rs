use clap::Parser;

use ems_sim::cli::{self, Cli, Command};

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => cli::run(&args),
    };
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
