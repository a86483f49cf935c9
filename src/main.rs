use std::process::exit;

fn main() {
    if let Err(e) = serviam::app::run_cli() {
        eprintln!("{e}");
        exit(1);
    }
}
