//! # Model Layer
//!
//! Domain entities for the publishing pipeline: the scheduled-content
//! aggregate the tasks advance, the integration and publication rows backing
//! delivery, the generated article, and the transient publish result.

pub mod article;
pub mod content;
pub mod integration;
pub mod publication;
pub mod publish_result;

pub use article::Article;
pub use content::ScheduledContent;
pub use integration::{Integration, IntegrationType};
pub use publication::Publication;
pub use publish_result::{FailureKind, PublishResult};
