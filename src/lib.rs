pub mod column;
pub mod condition;
pub mod error;
pub mod queryset;
pub mod row;
pub mod store;

pub use error::{QueryError, QueryResult};
pub use queryset::{query, QuerySet};
