//! Back-office support: a tagged record type spanning every managed entity
//! and the substring search the admin tables run over it.

pub mod record;
pub mod search;

pub use record::AdminRecord;
pub use search::filter;
