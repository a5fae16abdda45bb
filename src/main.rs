fn main() {
    if let Err(err) = tracker_sheet::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
