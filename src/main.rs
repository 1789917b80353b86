fn main() -> anyhow::Result<()> {
    nestflow::run()
}
