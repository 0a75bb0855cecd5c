use comcigan::platform::comcigan::{Client, Options, api::SchoolFinder};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::new();

    let mut session = client
        .init(Options::default().with_cache_ttl(Duration::from_secs(60)))
        .await?;

    let schools = session.search("기흥").await?;
    let school = SchoolFinder::new("기흥고등학교", "경기")
        .find(&schools)
        .ok_or_else(|| anyhow::anyhow!("no matching school"))?;

    println!("{} {} ({})", school.region(), school.name(), school.code());
    session.set_school(school.code());

    println!("class times: {}", session.class_time_info().await?);

    let timetable = session.timetable().await?;

    for (grade, classes) in &timetable {
        for (class, week) in classes {
            println!("\n{grade}학년 {class}반");

            for day in week {
                let subjects: Vec<&str> = day
                    .iter()
                    .map(|entry| entry.as_ref().map_or("-", |entry| entry.subject()))
                    .collect();

                if let Some(Some(first)) = day.first() {
                    print!("{} ", first.weekday_label());
                }

                println!("{}", subjects.join(" "));
            }
        }
    }

    Ok(())
}
