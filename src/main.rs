use gridlight::DemoConfig;

fn main() -> anyhow::Result<()> {
    gridlight::run(DemoConfig::default())
}
