pub mod config;
pub mod logging;
pub mod http {
    pub mod headers;
}
pub mod runtime {
    pub mod limits;
    pub mod tool_cache;
}
