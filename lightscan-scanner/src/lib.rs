pub mod cancel;
pub mod crawler;
pub mod error;
pub mod http;
pub mod normalize;
pub mod result;
pub mod robots;

pub use cancel::CancelHandle;
pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use http::{Cookie, FormData, Headers, HttpClient, ReqwestClient, Response, SharedClient};
pub use result::{CrawlOutcome, FormDescriptor, FormInput, FormMethod, Page, SkipReason};
pub use robots::RobotsRuleSet;
