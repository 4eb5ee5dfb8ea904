pub mod db;
pub mod logger;
pub mod oauth;
pub mod quota;
pub mod report;
