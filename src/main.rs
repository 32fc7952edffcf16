fn main() {
    if let Err(err) = fide_ics_lib::run() {
        eprintln!("fide-ics failed: {err:#}");
        std::process::exit(1);
    }
}
