fn main() -> anyhow::Result<()> {
    glbsmith::cli::run_cli()
}
