use anyhow::Result;

fn main() -> Result<()> {
    solvebox::cli::run()
}
