//! Lists the open issues of a project and shows one of them in detail.
//!
//! Run with:
//! `REDMINE_HOST=https://redmine.example.com REDMINE_API_KEY=... cargo run --example list_issues -- <project>`

use redmine_client::{Client, Error, Format, Issue, RequestOptions};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("redmine_client=debug,list_issues=info")
        .init();

    let host = std::env::var("REDMINE_HOST").unwrap_or_else(|_| "https://www.redmine.org".to_string());
    let project = std::env::args().nth(1).unwrap_or_else(|| "redmine".to_string());

    let mut builder = Client::builder().host(&host)?.format(Format::Json);
    if let Ok(key) = std::env::var("REDMINE_API_KEY") {
        builder = builder.api_key(key)?;
    }
    let client = builder.build()?;

    let options = RequestOptions::new()
        .with_query_param("project_id", project.as_str())
        .with_query_param("status_id", "open")
        .with_query_param("sort", "updated_on:desc");

    let total = client.count::<Issue>(Some(&options)).await?;
    println!("{project}: {total} open issues");

    let page = client
        .list::<Issue>(Some(&options.clone().with_pagination(0, 10)))
        .await?;
    println!("Latest {} (took {:?}):", page.items.len(), page.latency);
    for issue in &page.items {
        println!(
            "  #{:<6} {:<12} {}",
            issue.id.unwrap_or_default(),
            issue.status.as_ref().and_then(|s| s.name.as_deref()).unwrap_or("?"),
            issue.subject
        );
    }

    if let Some(id) = page.items.first().and_then(|issue| issue.id) {
        let detail = client
            .get::<Issue>(&id.to_string(), Some(&RequestOptions::new().with_include(&["journals"])))
            .await?;
        println!();
        println!("#{id}: {}", detail.subject);
        println!("{}", detail.description.as_deref().unwrap_or("(no description)"));
        println!("Request id: {:?}", detail.correlation_id());
    }

    Ok(())
}
