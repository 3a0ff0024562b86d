mod cli;
mod collectors;
mod config;
mod driver;
mod error;
mod events;
mod finder;
mod freshness;
mod partition;
mod pipeline;
mod profiler;
mod resolver;
mod types;

fn main() {
  if let Err(e) = cli::run() {
    eprintln!("Error: {}", e);
    std::process::exit(1);
  }
}
