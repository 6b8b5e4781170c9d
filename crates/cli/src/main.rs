fn main() {
    env_logger::init();

    if let Err(error) = redline_cli::run(std::env::args_os()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
