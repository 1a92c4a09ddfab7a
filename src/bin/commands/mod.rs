pub mod build_cmd;
pub mod dump_cmd;
pub mod inspect_cmd;
pub mod ips_cmd;
pub mod query_cmd;
pub mod search_cmd;

pub use build_cmd::cmd_build;
pub use dump_cmd::cmd_dump;
pub use inspect_cmd::cmd_inspect;
pub use ips_cmd::cmd_ips;
pub use query_cmd::cmd_query;
pub use search_cmd::cmd_search;
