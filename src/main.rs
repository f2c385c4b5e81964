use anyhow::Result;

fn main() -> Result<()> {
    csv_remedy::run()
}
