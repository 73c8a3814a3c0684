use std::process;

use clap::Parser;

use triggerpattern::cli::Args;

fn main() {
    let args = Args::parse();
    triggerpattern::init_logging(args.debug);
    match triggerpattern::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(3);
        }
    }
}
