fn main() {
    if let Err(err) = terminal_diary::app::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
