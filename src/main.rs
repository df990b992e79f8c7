fn main() {
    #[cfg(feature = "cli")]
    oxiblt::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("oxiblt: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
