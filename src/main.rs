fn main() {
    if let Err(e) = seller_console_lib::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
