use comcigan::platform::comcigan::{Client, Options};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let keyword = std::env::args().nth(1).unwrap_or_else(|| "기흥".to_owned());

    let session = Client::new().init(Options::default()).await?;

    for school in session.search(&keyword).await? {
        println!(
            "{:>6} {} {} ({})",
            school.code(),
            school.region(),
            school.name(),
            school.raw_tag()
        );
    }

    Ok(())
}
