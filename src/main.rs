//! branchtale binary entry point.

fn main() {
    if let Err(err) = branchtale::cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
