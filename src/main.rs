mod cmd;

use clap::Parser;
use cmd::Cli;
use schema_uml::UmlError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cmd::run(cli) {
        // UmlError messages already carry their cause
        match e.downcast_ref::<UmlError>() {
            Some(err) => eprintln!("error: {err}"),
            None => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
}
