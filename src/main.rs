fn main() -> anyhow::Result<()> {
    cqs_dispatch::cli::run_cli()
}
