//! Retries transient failures and abandons a slow call.
//!
//! Run with: `REDMINE_HOST=https://redmine.example.com cargo run --example retry_and_cancel`

use redmine_client::retry::{RetryPolicy, RetryStrategy};
use redmine_client::{CancellationToken, Client, Error, Project, RequestOptions};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("redmine_client=info,retry_and_cancel=info")
        .init();

    let host = std::env::var("REDMINE_HOST").unwrap_or_else(|_| "https://www.redmine.org".to_string());
    let client = Client::builder()
        .host(&host)?
        .timeout(Duration::from_secs(10))
        .build()?;

    let policy = RetryPolicy::new(RetryStrategy::ExponentialBackoff {
        initial_delay: Duration::from_millis(250),
        max_delay: Duration::from_secs(4),
        max_retries: 4,
        jitter: true,
    })
    .with_max_rate_limit_wait(Duration::from_secs(30));

    match policy.run(|| client.list_all::<Project>(None)).await {
        Ok(projects) => println!("{} visible projects", projects.len()),
        Err(Error::MaxRetriesExceeded { attempts, last_error }) => {
            eprintln!("Server kept failing after {attempts} attempts: {last_error}");
        }
        Err(e) => return Err(e),
    }

    // Give up on a request after 50ms, no matter what the server does.
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let options = RequestOptions::new().with_cancellation(token);
    match client.list_all::<Project>(Some(&options)).await {
        Ok(projects) => println!("Fast server: {} projects", projects.len()),
        Err(e) if e.is_cancellation() => println!("Cancelled as requested: {e}"),
        Err(e) => return Err(e),
    }

    Ok(())
}
