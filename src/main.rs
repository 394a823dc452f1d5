fn main() {
    if let Err(e) = persistgql::cli::run() {
        persistgql::ui::output::error(format_args!("{e:#}"));
        std::process::exit(1);
    }
}
