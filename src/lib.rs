//! Client for the AceNext mock-interview practice service: the practice
//! setup form, the live interview session and the report pages.

pub mod backend;
pub mod config;
pub mod interview;
pub mod media;
pub mod navigation;
pub mod notifications;
pub mod practice;
pub mod report;
pub mod session;
pub mod storage;

pub use backend::BackendClient;
pub use config::{DegradePolicy, Settings};
pub use navigation::Page;
