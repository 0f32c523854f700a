use pingmon::cli::Cli;
use pingmon::config::{Configuration, CONFIG_FILE};
use pingmon::core::probe::ProbeDriver;
use pingmon::core::store::FileRecordStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    if cli.init {
        Configuration::init(&cli.data_dir).await?;
        println!("Initialized {}", cli.data_dir.display());
        return Ok(());
    }

    // Loading already validates, so --check only has to report success.
    let config_path = cli.data_dir.join(CONFIG_FILE);
    let config = Configuration::load(&config_path).await?;

    if cli.check {
        println!("✓ Configuration valid");
        return Ok(());
    }

    let id = cli
        .server_id
        .ok_or("no server id passed in the argument")?;
    let server = config
        .server(&id)
        .ok_or_else(|| format!("no server has the id \"{id}\""))?;

    let store = FileRecordStore::new(cli.data_dir.clone());
    let driver = ProbeDriver::new(Box::new(store));
    let record = driver.run(server).await?;

    println!(
        "{}: {}/{} attempts succeeded (min {}ms / avg {}ms / max {}ms)",
        id,
        record.success_count(),
        record.events_len(),
        record.time().min,
        record.time().avg,
        record.time().max,
    );

    Ok(())
}
