fn main() -> anyhow::Result<()> {
    folio_scene::run()
}
