use anyhow::Result;
use latis::{Client, OutputFormat, Preference, RangeSelection};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // RUST_LOG=latis=debug shows every request.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dataset = "sorce_tsi_24hr_l3";
    let client = Client::negotiated(
        "https://lasp.colorado.edu/lisird/latis",
        dataset,
        Preference::PreferCurrent,
    )?;
    println!("{dataset} is served by LaTiS {}", client.generation());

    for id in client.catalog()?.search(Some("tsi")) {
        println!("  {id}");
    }

    let mut tsi = client.dataset(dataset);
    tsi.project(["time", "tsi_1au"])
        .select(&RangeSelection::on("time").start("2020-01-01").end("2020-02-01"));

    let table = tsi.as_table()?;
    println!("{} rows, columns {:?}", table.len(), table.headers());

    let path = tsi.write_file("sorce_tsi_jan_2020", OutputFormat::Csv)?;
    println!("wrote {}", path.display());
    Ok(())
}
