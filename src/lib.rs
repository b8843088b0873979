//! # redmine-client
//!
//! A typed client for the Redmine REST API, built on `reqwest`.
//!
//! It turns typed entities into XML or JSON request bodies, sends them with
//! API key or Basic credentials, maps HTTP failures onto a structured
//! [`Error`], and reads responses back into entities or paginated
//! collections.
//!
//! ## Quick Start
//!
//! ```no_run
//! use redmine_client::{Client, IdentifiableName, Issue, RequestOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), redmine_client::Error> {
//!     let client = Client::builder()
//!         .host("https://redmine.example.com")?
//!         .api_key("0123456789abcdef")?
//!         .timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     // Read a single issue
//!     let issue = client.get::<Issue>("42", None).await?;
//!     println!("#42: {} ({:?})", issue.subject, issue.latency);
//!
//!     // Page through a project's open issues
//!     let options = RequestOptions::new()
//!         .with_query_param("project_id", "1")
//!         .with_pagination(0, 25);
//!     let page = client.list::<Issue>(Some(&options)).await?;
//!     println!("showing {} of {}", page.items.len(), page.total_count);
//!
//!     // Create one
//!     let draft = Issue {
//!         project: Some(IdentifiableName::new(1)),
//!         subject: "Printer on fire".to_string(),
//!         ..Issue::default()
//!     };
//!     let created = client.create(&draft, None).await?;
//!     println!("created #{:?}", created.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Status codes never leak to callers; they are translated into variants:
//!
//! ```no_run
//! use redmine_client::{Client, Error, Project};
//!
//! # async fn example(client: Client) -> Result<(), Error> {
//! let project = Project {
//!     name: "Core".to_string(),
//!     ..Project::default()
//! };
//!
//! match client.create(&project, None).await {
//!     Ok(created) => println!("created {:?}", created.id),
//!     Err(Error::UnprocessableEntity { message, .. }) => {
//!         // One server-side validation message per line
//!         eprintln!("rejected:\n{message}");
//!     }
//!     Err(e) if e.is_cancellation() => eprintln!("gave up: {e}"),
//!     Err(e) if e.is_transient() => eprintln!("try again later: {e}"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The client never retries on its own. Wrap calls in a
//! [`retry::RetryPolicy`] to repeat transient failures.

mod auth;
mod cancel;
mod client;
mod config;
mod entity;
mod error;
mod host;
mod paged;
pub mod rate_limit;
mod request;
mod response;
pub mod retry;
pub mod serialization;
mod transfer;

pub use auth::{Authentication, API_KEY_HEADER};
pub use cancel::CancellationToken;
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use entity::{
    ErrorInfo, IdentifiableName, Issue, IssueCategory, IssueCustomField, Project, TimeEntry,
    Upload, User,
};
pub use error::{BoxError, Error, Result};
pub use host::validate_host;
pub use paged::PagedResult;
pub use request::{RequestOptions, SWITCH_USER_HEADER};
pub use response::{Response, REQUEST_ID_HEADER};
pub use serialization::{Entity, Format, RedmineSerializer};
pub use transfer::{DownloadProgress, PROGRESS_INTERVAL};
