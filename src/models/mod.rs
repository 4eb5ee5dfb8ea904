pub mod quota;
pub mod token;

pub use quota::{ModelReport, QuotaReport};
pub use token::TokenInfo;
